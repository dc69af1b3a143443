//! A site-style schema and helpers for building documents against it.

use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use graphql_query_compiler::{CompileError, CompileOutput, CompilerOptions, QueryCompiler, SourceDocument};

/// Schema shaped like the node connections a static-site data layer exposes.
pub const TEST_SCHEMA: &str = r"
interface Node {
  id: ID!
  parent: Node
  children: [Node!]!
  internal: Internal!
}

type Internal {
  type: String!
  contentDigest: String!
}

scalar Date

enum SortOrderEnum {
  ASC
  DESC
}

input StringQueryOperatorInput {
  eq: String
  ne: String
  in: [String]
  nin: [String]
  regex: String
  glob: String
}

type PageInfo {
  currentPage: Int!
  hasPreviousPage: Boolean!
  hasNextPage: Boolean!
  itemCount: Int!
  pageCount: Int!
  perPage: Int
  totalCount: Int!
}

type File implements Node {
  id: ID!
  parent: Node
  children: [Node!]!
  internal: Internal!
  absolutePath: String
  publicURL: String
}

type FileConnection {
  totalCount: Int!
  nodes: [File!]!
  pageInfo: PageInfo!
}

input FileFilterInput {
  id: StringQueryOperatorInput
  absolutePath: StringQueryOperatorInput
  publicURL: StringQueryOperatorInput
}

type PostsJson implements Node {
  id: ID!
  parent: Node
  children: [Node!]!
  internal: Internal!
  text: String
  time(formatString: String, fromNow: Boolean, difference: String, locale: String): Date
  image: File
}

type PostsJsonEdge {
  next: PostsJson
  node: PostsJson!
  previous: PostsJson
}

type PostsJsonConnection {
  totalCount: Int!
  edges: [PostsJsonEdge!]!
  nodes: [PostsJson!]!
  pageInfo: PageInfo!
}

enum PostsJsonFieldsEnum {
  id
  text
  time
}

input PostsJsonFilterInput {
  id: StringQueryOperatorInput
  text: StringQueryOperatorInput
}

input PostsJsonSortInput {
  fields: [PostsJsonFieldsEnum]
  order: [SortOrderEnum] = [ASC]
}

type Query {
  allFile(filter: FileFilterInput, skip: Int, limit: Int): FileConnection!
  allPostsJson(filter: PostsJsonFilterInput, sort: PostsJsonSortInput, skip: Int, limit: Int): PostsJsonConnection!
  postsJson(id: ID!): PostsJson
  file(id: ID!): File
}
";

/// Parse and validate [`TEST_SCHEMA`].
///
/// # Panics
///
/// Panics if the fixture schema is invalid.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_schema() -> Valid<Schema> {
    Schema::parse_and_validate(TEST_SCHEMA, "schema.graphql").expect("fixture schema is valid")
}

/// Parse a document fixture.
///
/// # Panics
///
/// Panics if `text` is not valid GraphQL syntax.
#[must_use]
#[allow(clippy::expect_used)]
pub fn document(path: &str, text: &str) -> SourceDocument {
    SourceDocument::parse(path, text).expect("fixture document parses")
}

/// Output and errors of one pass.
#[derive(Debug)]
pub struct Compiled {
    pub output: CompileOutput,
    pub errors: Vec<CompileError>,
}

impl Compiled {
    /// Printed text of the query compiled for `path`, if any.
    #[must_use]
    pub fn text(&self, path: &str) -> Option<&str> {
        self.output
            .queries
            .get(path)
            .map(|query| query.text.as_str())
    }
}

/// Compile `documents` against [`TEST_SCHEMA`] with default options.
#[must_use]
pub fn compile(documents: &[SourceDocument]) -> Compiled {
    compile_with_options(documents, CompilerOptions::default())
}

#[must_use]
pub fn compile_with_options(documents: &[SourceDocument], options: CompilerOptions) -> Compiled {
    let schema = test_schema();
    let compiler = QueryCompiler::new(&schema).with_options(options);
    let mut errors = Vec::new();
    let output = compiler.compile(documents, &mut errors);
    Compiled { output, errors }
}

//! End-to-end compile passes against the site-style fixture schema.

use graphql_query_compiler::{
    CompileError, CompilerOptions, ErrorLocation, ExtractionOffset, LineColumn, OperationFlags,
    QueryCompiler, SourceDocument,
};
use graphql_test_utils::fixtures::compile_with_options;
use graphql_test_utils::{compile, document, format_errors, test_schema};
use std::sync::Arc;

const SIMPLE_QUERY: &str = "query mockFileQuery {
  allPostsJson {
    nodes {
      id
    }
  }
}";

fn fragment_count(text: &str, name: &str) -> usize {
    text.matches(&format!("fragment {name} on")).count()
}

#[test]
fn compiles_a_query() {
    let compiled = compile(&[document("mockFile", SIMPLE_QUERY)]);

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    assert_eq!(compiled.output.queries.len(), 1);

    let query = &compiled.output.queries["mockFile"];
    assert_eq!(query.name.as_ref(), "mockFileQuery");
    assert_eq!(query.path.as_ref(), "mockFile");
    assert_eq!(query.original_text.as_ref(), SIMPLE_QUERY);
    assert!(query.text.contains("query mockFileQuery"));
    assert!(query.text.contains("allPostsJson"));
    assert!(!query.is_hook);
    assert!(!query.is_static_query);
    assert_eq!(query.id, None);
}

#[test]
fn compiles_static_query_with_path_id() {
    let documents = [
        document("/site/src/components/Header.js", SIMPLE_QUERY).with_flags(OperationFlags {
            is_hook: true,
            is_static_query: true,
            hash: Some(Arc::from("hash")),
        }),
    ];
    let compiled =
        compile_with_options(&documents, CompilerOptions::default().with_project_root("/site"));

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    let query = &compiled.output.queries["/site/src/components/Header.js"];
    assert!(query.is_hook);
    assert!(query.is_static_query);
    assert_eq!(query.hash.as_deref(), Some("hash"));
    assert_eq!(query.id.as_deref(), Some("sq--src-components-header-js"));
}

#[test]
fn adds_fragments_from_same_document() {
    let compiled = compile(&[document(
        "mockFile",
        "query mockFileQuery { allPostsJson { nodes { ...PostsJsonFragment } } }
         fragment PostsJsonFragment on PostsJson { id }",
    )]);

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    let text = compiled.text("mockFile").unwrap();
    assert_eq!(fragment_count(text, "PostsJsonFragment"), 1);
}

#[test]
fn adds_fragments_from_other_documents() {
    let compiled = compile(&[
        document(
            "mockFile",
            "query mockFileQuery { allPostsJson { nodes { ...PostsJsonFragment } } }",
        ),
        document(
            "mockComponent",
            "fragment PostsJsonFragment on PostsJson { id ...ImageFragment }",
        ),
        document("mockImage", "fragment ImageFragment on PostsJson { image { publicURL } }"),
    ]);

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    assert_eq!(compiled.output.queries.len(), 1);
    let text = compiled.text("mockFile").unwrap();
    assert_eq!(fragment_count(text, "PostsJsonFragment"), 1);
    assert_eq!(fragment_count(text, "ImageFragment"), 1);
    assert!(text.contains("query mockFileQuery"));
}

#[test]
fn removes_unused_fragments() {
    let compiled = compile(&[document(
        "mockFile",
        "query mockFileQuery { allPostsJson { nodes { ...PostsJsonFragment } } }
         fragment PostsJsonFragment on PostsJson { id }
         fragment UnusedFragment on PostsJson { id }",
    )]);

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    let text = compiled.text("mockFile").unwrap();
    assert_eq!(fragment_count(text, "PostsJsonFragment"), 1);
    assert_eq!(fragment_count(text, "UnusedFragment"), 0);
}

#[test]
fn accepts_identical_fragment_definitions() {
    let compiled = compile(&[
        document(
            "mockFile",
            "query mockFileQuery { allPostsJson { nodes { ...PostsJsonFragment } } }",
        ),
        document("mockComponent1", "fragment PostsJsonFragment on PostsJson { id }"),
        document(
            "mockComponent2",
            "fragment PostsJsonFragment on PostsJson {\n  id\n}",
        ),
    ]);

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    assert_eq!(compiled.output.queries.len(), 1);
    let text = compiled.text("mockFile").unwrap();
    assert_eq!(fragment_count(text, "PostsJsonFragment"), 1);
}

#[test]
fn shared_fragments_appear_once_per_query() {
    let compiled = compile(&[
        document(
            "pageA",
            "query PageA { allPostsJson { nodes { ...Left ...Right } } }",
        ),
        document("pageB", "query PageB { allPostsJson { nodes { ...Right ...Shared } } }"),
        document(
            "fragments",
            "fragment Left on PostsJson { ...Shared text }
             fragment Right on PostsJson { ...Shared image { id } }
             fragment Shared on PostsJson { id }",
        ),
    ]);

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    for path in ["pageA", "pageB"] {
        let text = compiled.text(path).unwrap();
        assert_eq!(fragment_count(text, "Shared"), 1, "{path}");
        assert_eq!(fragment_count(text, "Right"), 1, "{path}");
    }
    assert_eq!(fragment_count(compiled.text("pageA").unwrap(), "Left"), 1);
    assert_eq!(fragment_count(compiled.text("pageB").unwrap(), "Left"), 0);
}

#[test]
fn errors_on_unknown_fragment() {
    let compiled = compile(&[document(
        "mockFile",
        "query mockFileQuery {
  allPostsJson {
    nodes {
      ...UnknownFragment
    }
  }
}",
    )]);

    insta::assert_snapshot!(
        format_errors(&compiled.errors),
        @r#"[1] unknown-fragment mockFile:4:7 The fragment "UnknownFragment" does not exist."#
    );
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn suggests_similarly_named_fragment() {
    let compiled = compile(&[
        document(
            "mockFile",
            "query mockFileQuery { allPostsJson { nodes { ...PostJsonFragment } } }",
        ),
        document("mockComponent", "fragment PostsJsonFragment on PostsJson { id }"),
    ]);

    insta::assert_snapshot!(
        format_errors(&compiled.errors),
        @r#"[1] unknown-fragment mockFile:1:46 The fragment "PostJsonFragment" does not exist. Did you mean "PostsJsonFragment"?"#
    );
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn reports_every_missing_fragment_of_an_operation() {
    let compiled = compile(&[document(
        "mockFile",
        "query mockFileQuery { allPostsJson { nodes { ...First ...Second } } }",
    )]);

    insta::assert_snapshot!(format_errors(&compiled.errors), @r#"
    [1] unknown-fragment mockFile:1:46 The fragment "First" does not exist.
    [2] unknown-fragment mockFile:1:55 The fragment "Second" does not exist.
    "#);
}

#[test]
fn errors_on_duplicate_fragment_names() {
    let compiled = compile(&[
        document(
            "mockFile",
            "query mockFileQuery { allPostsJson { nodes { ...PostsJsonFragment } } }",
        ),
        document("mockComponent1", "fragment PostsJsonFragment on PostsJson { id }"),
        document(
            "mockComponent2",
            "fragment PostsJsonFragment on PostsJson { id node }",
        ),
    ]);

    insta::assert_snapshot!(format_errors(&compiled.errors), @r#"
    [1] duplicate-fragment mockComponent2:1:1 Found two different GraphQL fragments with identical name "PostsJsonFragment". Fragment names must be unique
    [2] unknown-fragment mockFile:1:46 The fragment "PostsJsonFragment" does not exist.
    "#);
    assert!(compiled.output.queries.is_empty());

    let CompileError { kind, .. } = &compiled.errors[0];
    let context = serde_json::to_value(kind).unwrap();
    assert_eq!(context["left"]["filePath"], "mockComponent2");
    assert_eq!(context["right"]["filePath"], "mockComponent1");
    assert_eq!(context["right"]["location"], serde_json::json!({ "line": 1, "column": 1 }));
}

#[test]
fn errors_on_wrong_type_of_fragment() {
    let compiled = compile(&[
        document(
            "mockFile",
            "query mockFileQuery {
  allPostsJson {
    nodes {
      ...PostsJsonFragment
    }
  }
}",
        ),
        document(
            "mockComponent",
            "fragment PostsJsonFragment on PostsJsonConnection { nodes { id } }",
        ),
    ]);

    assert!(!compiled.errors.is_empty());
    let first = &compiled.errors[0];
    assert_eq!(first.tag(), "schema-validation");
    assert_eq!(first.file_path.as_ref(), "mockFile");
    assert_eq!(
        first.location.map(|location| location.line_column().line),
        Some(4)
    );
    assert!(compiled
        .errors
        .iter()
        .all(|error| error.tag() == "schema-validation"));
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn errors_on_double_root() {
    let compiled = compile(&[document(
        "mockFile",
        "query mockFileQuery { allPostsJson { nodes { id } } }
query AnotherQuery { allPostsJson { nodes { id } } }",
    )]);

    insta::assert_snapshot!(
        format_errors(&compiled.errors),
        @r#"[1] multiple-root-operations mockFile:2:1 Multiple "root" queries found: "AnotherQuery" and "mockFileQuery". Only the first ("mockFileQuery") will be registered."#
    );
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn first_operation_of_contested_file_is_still_diagnosed() {
    let compiled = compile(&[document(
        "mockFile",
        "query mockFileQuery { allPostsJson { nodes { ...Missing } } }
query AnotherQuery { allPostsJson { nodes { id } } }",
    )]);

    let tags: Vec<&str> = compiled.errors.iter().map(CompileError::tag).collect();
    assert_eq!(tags, vec!["unknown-fragment", "multiple-root-operations"]);
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn errors_on_invalid_graphql() {
    let compiled = compile(&[document(
        "mockFile",
        "query { allPostsJson { nodes { id } } }
query { allFile { nodes { id } } }",
    )]);

    insta::assert_snapshot!(format_errors(&compiled.errors), @r"
    [1] structural-validation mockFile:1:1 This anonymous operation must be the only defined operation.
    [2] structural-validation mockFile:2:1 This anonymous operation must be the only defined operation.
    ");
    assert!(compiled.output.queries.is_empty());
    assert_eq!(compiled.output.stats.rejected_documents, 1);

    let json = serde_json::to_value(&compiled.errors[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "kind": "structural-validation",
            "code": "85901",
            "filePath": "mockFile",
            "location": { "start": { "line": 1, "column": 1 } },
            "context": {
                "message": "This anonymous operation must be the only defined operation."
            }
        })
    );
}

#[test]
fn errors_on_schema_aware_invalid_graphql() {
    let compiled = compile(&[document(
        "mockFile",
        "query mockFileQuery {
  allPostsJson {
    id
  }
}",
    )]);

    assert_eq!(compiled.errors.len(), 1);
    let error = &compiled.errors[0];
    assert_eq!(error.tag(), "schema-validation");
    assert_eq!(error.code(), "85901");
    assert_eq!(error.file_path.as_ref(), "mockFile");
    assert_eq!(
        error.location,
        Some(ErrorLocation::At(LineColumn::new(3, 5)))
    );
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn schema_errors_inside_fragments_point_at_the_fragment_file() {
    let compiled = compile(&[
        document(
            "src/pages/index.js",
            "query Index { allPostsJson { nodes { ...Card } } }",
        ),
        document(
            "src/components/card.js",
            "fragment Card on PostsJson {
  id
  nope
}",
        ),
    ]);

    assert_eq!(compiled.errors.len(), 1);
    let error = &compiled.errors[0];
    assert_eq!(error.tag(), "schema-validation");
    assert_eq!(error.file_path.as_ref(), "src/components/card.js");
    assert_eq!(
        error.location,
        Some(ErrorLocation::At(LineColumn::new(3, 3)))
    );

    let json = serde_json::to_value(error).unwrap();
    assert_eq!(json["context"]["operationName"], "Index");
    assert_eq!(json["context"]["operationPath"], "src/pages/index.js");
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn rejected_document_does_not_block_others() {
    let compiled = compile(&[
        document(
            "broken",
            "fragment BrokenFragment on Missing { id }",
        ),
        document("page", SIMPLE_QUERY),
        document(
            "usesBroken",
            "query UsesBroken { allPostsJson { nodes { ...BrokenFragment } } }",
        ),
    ]);

    insta::assert_snapshot!(format_errors(&compiled.errors), @r#"
    [1] structural-validation broken:1:28 Unknown type "Missing".
    [2] unknown-fragment usesBroken:1:43 The fragment "BrokenFragment" does not exist.
    "#);
    assert_eq!(
        compiled.output.queries.keys().map(|path| &**path).collect::<Vec<&str>>(),
        vec!["page"]
    );
}

#[test]
fn errors_on_fragment_cycles() {
    let compiled = compile(&[
        document(
            "mockFile",
            "query mockFileQuery { allPostsJson { nodes { ...A } } }",
        ),
        document("cycleA", "fragment A on PostsJson { id ...B }"),
        document("cycleB", "fragment B on PostsJson { text ...A }"),
        document("other", "query Other { allPostsJson { nodes { ...B } } }"),
    ]);

    insta::assert_snapshot!(format_errors(&compiled.errors), @r#"
    [1] fragment-cycle cycleB:1:32 Cannot spread fragment "A" within itself via "B".
    [2] fragment-cycle cycleB:1:32 Cannot spread fragment "A" within itself via "B".
    "#);
    assert!(compiled.output.queries.is_empty());
}

#[test]
fn compiles_lone_anonymous_operation() {
    let compiled = compile(&[document("page", "{ allFile { nodes { publicURL } } }")]);

    assert_eq!(format_errors(&compiled.errors), "(no errors)");
    assert_eq!(compiled.output.queries["page"].name.as_ref(), "");
}

#[test]
fn translates_locations_of_embedded_documents() {
    let text = "query Embedded { allPostsJson { nodes { ...OnFirstLine } } }
      query Second { allPostsJson { nodes { id } } }";
    let documents = [document("src/pages/index.js", text).with_offset(ExtractionOffset::new(10, 4))];
    let compiled = compile(&documents);

    assert_eq!(compiled.errors.len(), 1);
    let error = &compiled.errors[0];
    assert_eq!(error.tag(), "multiple-root-operations");
    assert_eq!(error.location, Some(ErrorLocation::At(LineColumn::new(12, 7))));

    let single = [
        document("src/pages/other.js", "query Embedded {\n  allPostsJson { nodes { ...Gone } }\n}")
            .with_offset(ExtractionOffset::new(10, 4)),
        document("src/pages/first.js", "query First { allPostsJson { nodes { ...Gone } } }")
            .with_offset(ExtractionOffset::new(3, 20)),
    ];
    let compiled = compile(&single);
    insta::assert_snapshot!(format_errors(&compiled.errors), @r#"
    [1] unknown-fragment src/pages/other.js:12:26 The fragment "Gone" does not exist.
    [2] unknown-fragment src/pages/first.js:4:58 The fragment "Gone" does not exist.
    "#);
}

#[test]
fn compiling_twice_is_deterministic() {
    let documents = [
        document(
            "pageA",
            "query PageA { allPostsJson { nodes { ...Left ...Right } } }",
        )
        .with_flags(OperationFlags {
            is_static_query: true,
            ..OperationFlags::default()
        }),
        document(
            "fragments",
            "fragment Left on PostsJson { ...Shared }
             fragment Right on PostsJson { ...Shared }
             fragment Shared on PostsJson { id }",
        ),
    ];

    let first = compile(&documents);
    let second = compile(&documents);
    assert_eq!(first.output.queries, second.output.queries);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.output.queries["pageA"].id.as_deref(), Some("sq--page-a"));
}

#[test]
fn closure_sink_receives_errors_in_order() {
    let schema = test_schema();
    let compiler = QueryCompiler::new(&schema);
    let documents = [
        document("a", "query A { allPostsJson { nodes { ...Missing } } }"),
        document("b", "query B { allPostsJson { nodes { id } } } query C { allFile { totalCount } }"),
    ];

    let mut tags = Vec::new();
    let output = compiler.compile(&documents, &mut |error: CompileError| tags.push(error.tag()));

    assert_eq!(tags, vec!["unknown-fragment", "multiple-root-operations"]);
    assert!(output.queries.is_empty());
    assert_eq!(output.stats.documents, 2);
    assert_eq!(output.stats.operations, 3);
    assert_eq!(output.stats.compiled, 0);
}

#[test]
fn compiled_query_serializes_camel_case() {
    let compiled = compile(&[document("mockFile", SIMPLE_QUERY).with_flags(OperationFlags {
        hash: Some(Arc::from("hash")),
        ..OperationFlags::default()
    })]);
    let json = serde_json::to_value(&compiled.output.queries["mockFile"]).unwrap();

    assert_eq!(json["name"], "mockFileQuery");
    assert_eq!(json["path"], "mockFile");
    assert_eq!(json["originalText"], SIMPLE_QUERY);
    assert_eq!(json["isHook"], false);
    assert_eq!(json["isStaticQuery"], false);
    assert_eq!(json["hash"], "hash");
    assert!(json.get("id").is_none());
}

#[test]
fn syntax_errors_surface_before_compiling() {
    let error = SourceDocument::parse("broken.graphql", "query { allFile {").unwrap_err();
    assert_eq!(error.path.as_ref(), "broken.graphql");
    assert!(error.to_string().starts_with("broken.graphql: "));
}

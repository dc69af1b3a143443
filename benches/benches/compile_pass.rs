use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use graphql_query_compiler::{CompileError, QueryCompiler, SourceDocument};
use graphql_test_utils::{document, test_schema};
use std::hint::black_box;

// Fragments shared by every page, with a diamond through `PostImage`.
const SHARED_FRAGMENTS: &str = r#"
fragment PostCard on PostsJson {
  id
  ...PostText
  ...PostImage
}

fragment PostText on PostsJson {
  text
  time(formatString: "YYYY-MM-DD")
}

fragment PostImage on PostsJson {
  image {
    ...ImageFile
  }
}

fragment ImageFile on File {
  id
  publicURL
}

fragment PostHero on PostsJson {
  ...PostImage
  text
}
"#;

/// A site with one page per `pages` plus shared and per-page fragments.
fn site(pages: usize) -> Vec<SourceDocument> {
    let mut documents = vec![document("src/components/fragments.js", SHARED_FRAGMENTS)];

    for page in 0..pages {
        let text = format!(
            "query Page{page}Query($skip: Int) {{
  allPostsJson(skip: $skip, limit: 10) {{
    nodes {{
      ...PostCard
      ...Page{page}Extra
    }}
    pageInfo {{
      hasNextPage
    }}
  }}
}}

fragment Page{page}Extra on PostsJson {{
  ...PostHero
  internal {{
    type
  }}
}}"
        );
        documents.push(document(&format!("src/pages/page-{page}.js"), &text));
    }

    documents
}

fn bench_compile_pass(c: &mut Criterion) {
    let schema = test_schema();
    let compiler = QueryCompiler::new(&schema);
    let mut group = c.benchmark_group("compile_pass");

    for pages in [10, 100, 500] {
        let documents = site(pages);
        group.bench_with_input(BenchmarkId::from_parameter(pages), &documents, |b, documents| {
            b.iter(|| {
                let mut errors: Vec<CompileError> = Vec::new();
                let output = compiler.compile(black_box(documents), &mut errors);
                assert!(errors.is_empty());
                black_box(output)
            });
        });
    }

    group.finish();
}

fn bench_compile_with_errors(c: &mut Criterion) {
    let schema = test_schema();
    let compiler = QueryCompiler::new(&schema);

    c.bench_function("compile_pass_missing_fragments", |b| {
        b.iter_batched(
            || {
                // Every page spreads a fragment that no longer exists.
                let mut documents = site(100);
                documents.remove(0);
                documents
            },
            |documents| {
                let mut errors: Vec<CompileError> = Vec::new();
                let output = compiler.compile(&documents, &mut errors);
                black_box((output, errors))
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_compile_pass, bench_compile_with_errors);
criterion_main!(benches);

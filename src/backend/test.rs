//! Mock and HTTP test backend.

use super::{Backend, BackendKind, CommonContext, GenerationInput, OperationView};
use crate::error::Result;
use crate::fixture::ResolvedCase;
use crate::render::{HelperRegistrar, TemplateAsset, TEST_TEMPLATE};
use crate::spec::ParamBinding;
use log::warn;
use minijinja::value::ViaDeserialize;
use minijinja::{Environment, Value};
use serde::Serialize;

const ASYNC_TRAIT_IMPORT: &str = "use async_trait::async_trait;";

pub struct TestBackend;

#[derive(Debug, Clone, Serialize)]
struct TestView {
    operation: OperationView,
    cases: Vec<ResolvedCase>,
}

#[derive(Debug, Clone, Serialize)]
struct TestContext {
    #[serde(flatten)]
    common: CommonContext,
    router_path: String,
    tests: Vec<TestView>,
}

impl Backend for TestBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Test
    }

    fn file_name(&self) -> &'static str {
        "http_test.rs"
    }

    fn default_template(&self) -> TemplateAsset {
        TemplateAsset::new("http_test.rs.j2", TEST_TEMPLATE)
    }

    fn helpers(&self) -> Option<HelperRegistrar> {
        Some(register)
    }

    fn context(&self, input: &GenerationInput<'_>) -> Result<Value> {
        let (mut extra_imports, resolved) = match input.fixtures {
            Some(fixtures) => (fixtures.imports.clone(), fixtures.resolve(input.spec)?),
            None => (Vec::new(), Vec::new()),
        };
        if input.spec.package.async_trait {
            extra_imports.push(ASYNC_TRAIT_IMPORT.to_string());
        }
        let common = CommonContext::new(input, &extra_imports)?;

        let mut tests = Vec::with_capacity(resolved.len());
        for op in &common.operations {
            match resolved.iter().find(|t| t.operation == op.name) {
                Some(test) => tests.push(TestView {
                    operation: op.clone(),
                    cases: test.cases.clone(),
                }),
                None if input.fixtures.is_some() => {
                    warn!("No test cases for operation {}", op.name)
                }
                None => {}
            }
        }

        Ok(Value::from_serialize(&TestContext {
            common,
            router_path: input.options.router_path.clone(),
            tests,
        }))
    }
}

fn register(env: &mut Environment<'_>) {
    env.add_function("mock_fn_type", mock_fn_type);
}

/// `Fn(A, B) -> R` matching a trait method, context parameters included.
fn mock_fn_type(params: ViaDeserialize<Vec<ParamBinding>>, return_type: &str) -> String {
    let args = params
        .0
        .iter()
        .map(|p| p.ty.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    if return_type.is_empty() {
        format!("Fn({})", args)
    } else {
        format!("Fn({}) -> {}", args, return_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::item_service;
    use crate::backend::{generate, GenerationOptions};
    use crate::codec::CodecRegistry;
    use crate::error::GenerationError;
    use crate::fixture::FixtureFile;
    use crate::spec::Location;

    const FIXTURES: &str = r#"
imports:
  - use crate::errors::ItemError;
tests:
  - name: upload
    cases:
      - name: uploads the file
        request:
          method: POST
          path: /upload
          headers:
            content-type: application/json
          body: '{"file_name":"a.txt","file":{"size":3}}'
        want_in:
          file_name: a.txt
        out: Ok(())
        want_response:
          status_code: 204
  - name: list_items
    cases:
      - name: rejects a bad limit
        request:
          method: GET
          path: /items?limit=abc
        want_response:
          status_code: 400
          content_type: application/json; charset=utf-8
          body: '{"error":"invalid value for `limit`: invalid digit found in string"}'
"#;

    fn render(fixtures: Option<&FixtureFile>) -> Result<String> {
        let spec = item_service();
        let options = GenerationOptions::default();
        let codecs = CodecRegistry::default();
        let input = GenerationInput {
            spec: &spec,
            codecs: &codecs,
            options: &options,
            fixtures,
        };
        Ok(generate(&input, &[BackendKind::Test])?.remove(0).content)
    }

    #[test]
    fn test_mock_covers_every_method() {
        let out = render(None).unwrap();
        assert!(out.contains("pub struct ItemServiceMock {"));
        assert!(out.contains(
            "    pub get_item_fn: Option<Box<dyn Fn(&Context, u32) -> Result<Item, ItemError> + Send + Sync>>,"
        ));
        assert!(out.contains("use async_trait::async_trait;"));
        assert!(out.contains("use crate::service::Context;"));
        assert!(out.contains("#[async_trait]\nimpl ItemService for ItemServiceMock {"));
        assert!(out.contains(
            "    async fn get_item(&self, ctx: &Context, id: u32) -> Result<Item, ItemError> {"
        ));
        assert!(out.contains("        f(ctx, id)\n"));
        assert!(!out.contains("#[tokio::test]"));
    }

    #[test]
    fn test_cases_are_unrolled() {
        let fixtures = FixtureFile::from_yaml(FIXTURES).unwrap();
        let out = render(Some(&fixtures)).unwrap();

        assert!(out.contains("use crate::errors::ItemError;"));
        assert!(out.contains("use super::http::new_http_router;"));
        assert_eq!(out.matches("#[tokio::test]").count(), 2);

        let upload = &out[out.find("async fn test_http_upload()").unwrap()..];
        assert!(upload.contains("let captured_file_name = Arc::new(Mutex::new(None::<String>));"));
        assert!(upload.contains("move |file_name: String, _file: FileData| {"));
        assert!(upload.contains(".body(Body::from(r#\"{\"file_name\":\"a.txt\",\"file\":{\"size\":3}}\"#))"));
        assert!(upload.contains("assert_eq!(response.status().as_u16(), 204, \"uploads the file\");"));
        assert!(upload.contains("assert_eq!(content_type, None, \"uploads the file\");"));
        assert!(upload.contains(
            "assert_eq!(*captured_file_name.lock().unwrap(), Some(String::from(\"a.txt\")), \"uploads the file\");"
        ));

        let list = &out[out.find("async fn test_http_list_items()").unwrap()..];
        assert!(!list.contains("mock.list_items_fn"));
        assert!(list.contains("        let mock = ItemServiceMock::default();"));
        assert!(upload.contains("        let mut mock = ItemServiceMock::default();"));
        assert!(list.contains("assert_eq!(response.status().as_u16(), 400, \"rejects a bad limit\");"));
    }

    #[test]
    fn test_fixture_errors_abort_rendering() {
        let fixtures = FixtureFile::from_yaml(
            r#"
tests:
  - name: get_item
    cases:
      - name: bad id
        request: { method: GET, path: /items/1 }
        want_in: { id: -1 }
        out: Ok(Item::default())
        want_response: { status_code: 200 }
"#,
        )
        .unwrap();

        let err = render(Some(&fixtures)).unwrap_err();
        assert!(matches!(err, GenerationError::Fixture { ref test, .. } if test == "get_item"));
    }

    #[test]
    fn test_mock_fn_type() {
        let params = vec![ParamBinding {
            name: "id".to_string(),
            ty: "u32".to_string(),
            location: Location::Path,
            wire_name: "id".to_string(),
        }];
        assert_eq!(mock_fn_type(ViaDeserialize(params.clone()), ""), "Fn(u32)");
        assert_eq!(
            mock_fn_type(ViaDeserialize(params), "Option<Item>"),
            "Fn(u32) -> Option<Item>"
        );
    }
}

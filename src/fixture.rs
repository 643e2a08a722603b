//! Literal HTTP test cases, loaded from YAML.
//!
//! ```yaml
//! imports:
//!   - use crate::model::Item;
//! tests:
//!   - name: get_item
//!     cases:
//!       - name: ok
//!         request:
//!           method: GET
//!           path: /items/1
//!         want_in:
//!           id: 1
//!         out: Ok(Item::default())
//!         want_response:
//!           status_code: 200
//!           content_type: application/json; charset=utf-8
//!           body: '{"id":0,"name":""}'
//! ```

use crate::error::{GenerationError, Result};
use crate::spec::{HttpMethod, Location, ServiceSpecification};
use crate::wire;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureFile {
    /// Extra `use` lines for the generated test module
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub tests: Vec<OperationFixture>,
}

/// The cases of one operation; `name` is the operation name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationFixture {
    pub name: String,
    pub cases: Vec<FixtureCase>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCase {
    pub name: String,
    pub request: FixtureRequest,
    /// Expected handler inputs by parameter name
    #[serde(default)]
    pub want_in: BTreeMap<String, serde_json::Value>,
    /// Rust expression the mock returns; without it the handler must not be called
    #[serde(default)]
    pub out: Option<String>,
    pub want_response: FixtureResponse,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureRequest {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureResponse {
    pub status_code: u16,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// A validated case with every literal rendered as Rust source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCase {
    pub name: String,
    pub request: ResolvedRequest,
    pub want_in: Vec<ExpectedInput>,
    /// Names of the captured parameters
    pub captured: Vec<String>,
    pub out: Option<String>,
    pub want_response: ResolvedResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<Header>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedResponse {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedInput {
    pub name: String,
    pub ty: String,
    pub literal: String,
}

/// Cases of one operation, in fixture order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTest {
    pub operation: String,
    pub cases: Vec<ResolvedCase>,
}

impl FixtureFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid fixtures: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let fixtures: FixtureFile = serde_yaml::from_str(content)?;
        Ok(fixtures)
    }

    /// Checks every case against `spec` and renders its literals.
    pub fn resolve(&self, spec: &ServiceSpecification) -> Result<Vec<ResolvedTest>> {
        let mut tests = Vec::with_capacity(self.tests.len());
        for fixture in &self.tests {
            let fail = |reason: String| GenerationError::Fixture {
                test: fixture.name.clone(),
                reason,
            };

            let op = spec
                .operation(&fixture.name)
                .ok_or_else(|| fail(format!("`{}` is not an operation of {}", fixture.name, spec.package.service_trait)))?;
            if tests.iter().any(|t: &ResolvedTest| t.operation == fixture.name) {
                return Err(fail("operation listed twice".to_string()));
            }

            let mut cases = Vec::with_capacity(fixture.cases.len());
            for case in &fixture.cases {
                let case_fail = |reason: String| fail(format!("case `{}`: {}", case.name, reason));

                if HttpMethod::parse(&case.request.method).is_none() {
                    return Err(case_fail(format!("unknown method `{}`", case.request.method)));
                }
                if !case.request.path.starts_with('/') {
                    return Err(case_fail(format!("path `{}` must start with `/`", case.request.path)));
                }
                if !(100..=599).contains(&case.want_response.status_code) {
                    return Err(case_fail(format!(
                        "status code {} is not an HTTP status",
                        case.want_response.status_code
                    )));
                }
                if case.out.is_none() && !case.want_in.is_empty() {
                    return Err(case_fail("`want_in` needs `out`, the handler is never called without it".to_string()));
                }

                let mut want_in = Vec::with_capacity(case.want_in.len());
                for (name, value) in &case.want_in {
                    let param = op
                        .params
                        .iter()
                        .find(|p| p.name == *name && p.location != Location::Context)
                        .ok_or_else(|| case_fail(format!("`{}` is not a wire parameter of {}", name, op.name)))?;
                    let literal = wire::rust_literal(&param.ty, value)
                        .map_err(|e| case_fail(format!("`{}`: {}", name, e)))?;
                    want_in.push(ExpectedInput {
                        name: name.clone(),
                        ty: param.ty.clone(),
                        literal,
                    });
                }

                cases.push(ResolvedCase {
                    name: case.name.clone(),
                    request: ResolvedRequest {
                        method: case.request.method.to_ascii_uppercase(),
                        path: case.request.path.clone(),
                        headers: case
                            .request
                            .headers
                            .iter()
                            .map(|(name, value)| Header {
                                name: name.clone(),
                                value: value.clone(),
                            })
                            .collect(),
                        body: case.request.body.clone(),
                    },
                    captured: want_in.iter().map(|input| input.name.clone()).collect(),
                    want_in,
                    out: case.out.clone(),
                    want_response: ResolvedResponse {
                        status_code: case.want_response.status_code,
                        content_type: case.want_response.content_type.clone(),
                        body: case.want_response.body.clone(),
                    },
                });
            }

            tests.push(ResolvedTest {
                operation: fixture.name.clone(),
                cases,
            });
        }
        Ok(tests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MethodDescriptor, Parameter, ServiceDescriptor};
    use crate::spec::builder::{BuildOptions, SpecBuilder};
    use pretty_assertions::assert_eq;

    fn spec() -> ServiceSpecification {
        let param = |name: &str, ty: &str, is_context: bool| Parameter {
            name: name.to_string(),
            ty: ty.to_string(),
            is_context,
        };
        let service = ServiceDescriptor {
            trait_name: "ItemService".to_string(),
            async_trait: true,
            methods: vec![MethodDescriptor {
                name: "list_items".to_string(),
                params: vec![param("ctx", "Context", true), param("limit", "i32", false)],
                returns: Vec::new(),
                return_type: String::new(),
                is_async: true,
                docs: vec![
                    "@http(op): GET /items".to_string(),
                    "@http(param): limit in=query".to_string(),
                ],
            }],
            imports: Vec::new(),
            local_types: Vec::new(),
        };
        SpecBuilder::new(BuildOptions::default()).build(&service).unwrap()
    }

    const FIXTURES: &str = r#"
imports:
  - use crate::model::Item;
tests:
  - name: list_items
    cases:
      - name: ok
        request:
          method: get
          path: /items?limit=5
          headers:
            x-request-id: abc
        want_in:
          limit: 5
        out: ()
        want_response:
          status_code: 204
      - name: bad limit
        request:
          method: GET
          path: /items?limit=abc
        want_response:
          status_code: 400
          content_type: application/json; charset=utf-8
          body: '{"error":"invalid value for `limit`: invalid digit found in string"}'
"#;

    #[test]
    fn test_resolve_fixtures() {
        let fixtures = FixtureFile::from_yaml(FIXTURES).unwrap();
        assert_eq!(fixtures.imports, vec!["use crate::model::Item;".to_string()]);

        let tests = fixtures.resolve(&spec()).unwrap();
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].operation, "list_items");

        let ok = &tests[0].cases[0];
        assert_eq!(ok.request.method, "GET");
        assert_eq!(
            ok.request.headers,
            vec![Header {
                name: "x-request-id".to_string(),
                value: "abc".to_string()
            }]
        );
        assert_eq!(
            ok.want_in,
            vec![ExpectedInput {
                name: "limit".to_string(),
                ty: "i32".to_string(),
                literal: "5i32".to_string(),
            }]
        );
        assert_eq!(ok.captured, vec!["limit".to_string()]);

        let bad = &tests[0].cases[1];
        assert_eq!(bad.out, None);
        assert_eq!(bad.want_response.status_code, 400);
    }

    fn resolve_err(yaml: &str) -> GenerationError {
        FixtureFile::from_yaml(yaml).unwrap().resolve(&spec()).unwrap_err()
    }

    #[test]
    fn test_unknown_operation() {
        let err = resolve_err(
            r#"
tests:
  - name: delete_everything
    cases: []
"#,
        );
        assert!(matches!(err, GenerationError::Fixture { ref test, .. } if test == "delete_everything"));
    }

    #[test]
    fn test_invalid_cases() {
        let cases = [
            // context parameters are not captured
            "want_in: { ctx: 1 }\n        out: ()",
            // unknown parameter
            "want_in: { offset: 1 }\n        out: ()",
            // literal does not fit
            "want_in: { limit: 3000000000 }\n        out: ()",
            // captured input without a handler call
            "want_in: { limit: 1 }",
        ];

        for case in cases {
            let yaml = format!(
                r#"
tests:
  - name: list_items
    cases:
      - name: broken
        request: {{ method: GET, path: /items }}
        {}
        want_response: {{ status_code: 204 }}
"#,
                case
            );
            let err = resolve_err(&yaml);
            assert!(matches!(err, GenerationError::Fixture { .. }), "{case}: {err:?}");
        }
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = FixtureFile::from_yaml("tests: []\nextra: 1\n").unwrap_err();
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("item_service.test.yaml");
        fs::write(&path, FIXTURES).unwrap();

        let fixtures = FixtureFile::load(&path).unwrap();
        assert_eq!(fixtures.tests[0].cases.len(), 2);
    }
}

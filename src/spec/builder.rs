use crate::annotation::{parse_annotation, Annotation};
use crate::error::{GenerationError, Result};
use crate::provider::{bare_type_names, MethodDescriptor, ServiceDescriptor};
use crate::spec::{Location, Operation, PackageInfo, ParamBinding, ServiceSpecification};
use heck::{ToLowerCamelCase, ToSnakeCase};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Naming of body record fields on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCase {
    /// Keep the Rust parameter name
    #[default]
    Snake,
    /// `file_name` becomes `fileName`
    Camel,
}

impl FieldCase {
    pub fn apply(&self, name: &str) -> String {
        match self {
            FieldCase::Snake => name.to_string(),
            FieldCase::Camel => name.to_lower_camel_case(),
        }
    }
}

/// Options that shape the Service Specification.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Module path the generated code imports the service trait from
    pub service_path: String,
    pub body_field_case: FieldCase,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            service_path: "crate".to_string(),
            body_field_case: FieldCase::Snake,
        }
    }
}

/// Merges method descriptors with their annotations into validated operations.
pub struct SpecBuilder {
    options: BuildOptions,
}

impl SpecBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Builds the Service Specification for `service`.
    ///
    /// Fails on the first invalid method; no partial specification is returned.
    pub fn build(&self, service: &ServiceDescriptor) -> Result<ServiceSpecification> {
        info!(
            "Building specification for {} ({} methods)",
            service.trait_name,
            service.methods.len()
        );

        let mut operations = Vec::with_capacity(service.methods.len());
        let mut routes: BTreeMap<(String, String), String> = BTreeMap::new();

        for method in &service.methods {
            let annotation = parse_annotation(&method.name, &method.docs)?;
            let operation = self.build_operation(method, annotation)?;

            let key = (operation.method.to_string(), operation.pattern.clone());
            if let Some(first) = routes.get(&key) {
                return Err(GenerationError::DuplicateRoute {
                    verb: key.0,
                    pattern: key.1,
                    first: first.clone(),
                    second: operation.name.clone(),
                });
            }
            routes.insert(key, operation.name.clone());

            debug!(
                "Operation {}: {} {}",
                operation.name, operation.method, operation.pattern
            );
            operations.push(operation);
        }

        Ok(ServiceSpecification {
            package: PackageInfo {
                name: service.trait_name.to_snake_case(),
                service_trait: service.trait_name.clone(),
                service_path: self.options.service_path.clone(),
                async_trait: service.async_trait,
            },
            operations,
            imports: self.imports(service),
        })
    }

    /// The declaring file's imports, plus one `use` of the types declared next to the
    /// trait that any method signature names.
    fn imports(&self, service: &ServiceDescriptor) -> Vec<String> {
        let mut imports = service.imports.clone();

        let referenced: Vec<String> = service
            .methods
            .iter()
            .flat_map(|m| m.params.iter().map(|p| p.ty.as_str()).chain(std::iter::once(m.return_type.as_str())))
            .flat_map(bare_type_names)
            .collect();
        let local: Vec<&str> = service
            .local_types
            .iter()
            .filter(|t| referenced.contains(t))
            .map(String::as_str)
            .collect();

        match local.as_slice() {
            [] => {}
            [single] => imports.push(format!("use {}::{};", self.options.service_path, single)),
            many => imports.push(format!(
                "use {}::{{{}}};",
                self.options.service_path,
                many.join(", ")
            )),
        }
        imports
    }

    /// Assigns a location to every parameter of `method` and validates the result
    /// against the pattern.
    pub fn build_operation(&self, method: &MethodDescriptor, annotation: Annotation) -> Result<Operation> {
        let ambiguous = |param: &str, reason: String| GenerationError::AmbiguousLocation {
            method: method.name.clone(),
            param: param.to_string(),
            reason,
        };

        for declared in &annotation.declared_locations {
            if !method.params.iter().any(|p| p.name == declared.param) {
                return Err(GenerationError::UnknownParameter {
                    method: method.name.clone(),
                    param: declared.param.clone(),
                    line: declared.line.clone(),
                });
            }
        }

        let mut params = Vec::with_capacity(method.params.len());
        for param in &method.params {
            let declared = annotation
                .declared_locations
                .iter()
                .find(|d| d.param == param.name)
                .map(|d| d.location);
            let is_placeholder = annotation.placeholders.iter().any(|p| *p == param.name);

            let location = if param.is_context {
                if let Some(location) = declared {
                    return Err(ambiguous(
                        &param.name,
                        format!("context parameters are never on the wire, but declared in={}", location),
                    ));
                }
                Location::Context
            } else if is_placeholder {
                match declared {
                    None | Some(Location::Path) => Location::Path,
                    Some(other) => {
                        return Err(ambiguous(
                            &param.name,
                            format!(
                                "matches placeholder `{{{}}}` but declared in={}",
                                param.name, other
                            ),
                        ))
                    }
                }
            } else {
                match declared {
                    Some(Location::Path) => {
                        return Err(ambiguous(
                            &param.name,
                            format!("declared in=path but `{}` has no such placeholder", annotation.pattern),
                        ))
                    }
                    Some(location) => location,
                    None => Location::Body,
                }
            };

            let wire_name = match location {
                Location::Body => self.options.body_field_case.apply(&param.name),
                _ => param.name.clone(),
            };

            params.push(ParamBinding {
                name: param.name.clone(),
                ty: param.ty.clone(),
                location,
                wire_name,
            });
        }

        for placeholder in &annotation.placeholders {
            let bound = params
                .iter()
                .any(|p| p.location == Location::Path && p.name == *placeholder);
            if !bound {
                return Err(GenerationError::UnboundPlaceholder {
                    method: method.name.clone(),
                    pattern: annotation.pattern.clone(),
                    placeholder: placeholder.clone(),
                });
            }
        }

        if annotation.method.discourages_body() && params.iter().any(|p| p.location == Location::Body) {
            warn!(
                "Operation {} sends a request body with {}",
                method.name, annotation.method
            );
        }

        Ok(Operation {
            name: method.name.clone(),
            method: annotation.method,
            pattern: annotation.pattern.clone(),
            params,
            returns: method.returns.clone(),
            return_type: method.return_type.clone(),
            is_async: method.is_async,
            annotation,
        })
    }
}

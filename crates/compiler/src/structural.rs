//! Validation that runs on each document before fragments are collected.
//!
//! Only rules that can be decided without knowing fragments defined in other
//! files run here:
//!
//! - lone anonymous operation
//! - known type names
//! - fragments on composite types
//! - variables are input types
//! - scalar leafs
//! - possible fragment spreads (inline, and named spreads of fragments in
//!   the same document)
//! - values of correct type
//! - variables in allowed position (following spreads of fragments in the
//!   same document)
//!
//! A spread of a fragment defined elsewhere is not an error here. Messages
//! match the wording of the reference GraphQL validator so they read the same
//! as the full validation done after assembly.

use crate::source::{name_offset, node_offset};
use apollo_compiler::ast::{self, Type, Value};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::{Name, Node, Schema};
use std::collections::{HashMap, HashSet};

/// One rule violation. `offset` is a byte offset into the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Violation {
    pub message: String,
    pub offset: Option<usize>,
}

/// A variable referenced where a value of `location_type` is expected.
struct Usage {
    name: Name,
    location_type: Type,
    has_location_default: bool,
}

/// What one definition references.
#[derive(Default)]
struct Scope {
    usages: Vec<Usage>,
    spreads: Vec<Name>,
}

pub(crate) fn validate_document(schema: &Schema, document: &ast::Document) -> Vec<Violation> {
    let fragments = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            ast::Definition::FragmentDefinition(fragment) => {
                Some((fragment.name.as_str(), fragment))
            }
            _ => None,
        })
        .collect();

    let mut checker = Checker {
        schema,
        fragments,
        violations: Vec::new(),
    };
    checker.check_document(document);
    checker.violations
}

struct Checker<'a> {
    schema: &'a Schema,
    fragments: HashMap<&'a str, &'a Node<ast::FragmentDefinition>>,
    violations: Vec<Violation>,
}

impl<'a> Checker<'a> {
    fn report(&mut self, message: String, offset: Option<usize>) {
        self.violations.push(Violation { message, offset });
    }

    fn check_document(&mut self, document: &'a ast::Document) {
        let operation_count = document
            .definitions
            .iter()
            .filter(|definition| matches!(definition, ast::Definition::OperationDefinition(_)))
            .count();

        let mut operations = Vec::new();
        let mut fragment_scopes: HashMap<&str, Scope> = HashMap::new();

        for definition in &document.definitions {
            match definition {
                ast::Definition::OperationDefinition(operation) => {
                    if operation.name.is_none() && operation_count > 1 {
                        self.report(
                            "This anonymous operation must be the only defined operation."
                                .to_string(),
                            node_offset(operation),
                        );
                    }
                    let scope = self.check_operation(operation);
                    operations.push((operation, scope));
                }
                ast::Definition::FragmentDefinition(fragment) => {
                    let scope = self.check_fragment(fragment);
                    fragment_scopes.insert(fragment.name.as_str(), scope);
                }
                _ => {}
            }
        }

        for (operation, scope) in &operations {
            self.check_variable_positions(operation, scope, &fragment_scopes);
        }
    }

    fn check_operation(&mut self, operation: &'a Node<ast::OperationDefinition>) -> Scope {
        let mut scope = Scope::default();

        for variable in &operation.variables {
            self.check_variable_definition(variable, &mut scope);
        }
        self.check_directives(&operation.directives, &mut scope);

        let root = self.schema.root_operation(operation.operation_type).cloned();
        self.check_selections(&operation.selection_set, root.as_ref(), &mut scope);
        scope
    }

    fn check_fragment(&mut self, fragment: &'a Node<ast::FragmentDefinition>) -> Scope {
        let mut scope = Scope::default();
        let condition = &fragment.type_condition;

        let schema = self.schema;
        let parent = match schema.types.get(condition) {
            None => {
                self.report(format!("Unknown type \"{condition}\"."), name_offset(condition));
                None
            }
            Some(ty) if !is_composite(ty) => {
                self.report(
                    format!(
                        "Fragment \"{}\" cannot condition on non composite type \"{condition}\".",
                        fragment.name
                    ),
                    name_offset(condition),
                );
                None
            }
            Some(_) => Some(condition.clone()),
        };

        self.check_directives(&fragment.directives, &mut scope);
        self.check_selections(&fragment.selection_set, parent.as_ref(), &mut scope);
        scope
    }

    fn check_variable_definition(
        &mut self,
        variable: &'a Node<ast::VariableDefinition>,
        scope: &mut Scope,
    ) {
        let schema = self.schema;
        let named = variable.ty.inner_named_type();
        match schema.types.get(named) {
            None => {
                self.report(format!("Unknown type \"{named}\"."), node_offset(&variable.ty));
                return;
            }
            Some(ty) if !is_input(ty) => {
                self.report(
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{}\".",
                        variable.name, *variable.ty
                    ),
                    node_offset(variable),
                );
                return;
            }
            Some(_) => {}
        }

        if let Some(default) = &variable.default_value {
            self.check_value(default, &variable.ty, false, scope);
        }
    }

    fn check_selections(
        &mut self,
        selections: &'a [ast::Selection],
        parent: Option<&Name>,
        scope: &mut Scope,
    ) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => self.check_field(field, parent, scope),
                ast::Selection::FragmentSpread(spread) => {
                    self.check_directives(&spread.directives, scope);
                    scope.spreads.push(spread.fragment_name.clone());

                    let fragment = self.fragments.get(spread.fragment_name.as_str()).copied();
                    if let (Some(parent), Some(fragment)) = (parent, fragment) {
                        let condition = &fragment.type_condition;
                        if self.is_known_composite(condition)
                            && !self.types_overlap(condition, parent)
                        {
                            self.report(
                                format!(
                                    "Fragment \"{}\" cannot be spread here as objects of type \
                                     \"{parent}\" can never be of type \"{condition}\".",
                                    spread.fragment_name
                                ),
                                node_offset(spread),
                            );
                        }
                    }
                }
                ast::Selection::InlineFragment(inline) => {
                    self.check_directives(&inline.directives, scope);
                    let own_type = match &inline.type_condition {
                        None => parent.cloned(),
                        Some(condition) => self.check_inline_condition(inline, condition, parent),
                    };
                    self.check_selections(&inline.selection_set, own_type.as_ref(), scope);
                }
            }
        }
    }

    fn check_inline_condition(
        &mut self,
        inline: &Node<ast::InlineFragment>,
        condition: &Name,
        parent: Option<&Name>,
    ) -> Option<Name> {
        let schema = self.schema;
        match schema.types.get(condition) {
            None => {
                self.report(format!("Unknown type \"{condition}\"."), name_offset(condition));
                None
            }
            Some(ty) if !is_composite(ty) => {
                self.report(
                    format!("Fragment cannot condition on non composite type \"{condition}\"."),
                    name_offset(condition),
                );
                None
            }
            Some(_) => {
                if let Some(parent) = parent {
                    if !self.types_overlap(condition, parent) {
                        self.report(
                            format!(
                                "Fragment cannot be spread here as objects of type \"{parent}\" \
                                 can never be of type \"{condition}\"."
                            ),
                            node_offset(inline),
                        );
                    }
                }
                Some(condition.clone())
            }
        }
    }

    fn check_field(&mut self, field: &'a Node<ast::Field>, parent: Option<&Name>, scope: &mut Scope) {
        let schema = self.schema;
        let definition = parent.and_then(|parent| {
            if field.name.as_str() == "__typename" {
                return None;
            }
            schema.type_field(parent.as_str(), field.name.as_str()).ok()
        });

        for argument in &field.arguments {
            let argument_definition = definition.and_then(|definition| {
                definition
                    .arguments
                    .iter()
                    .find(|candidate| candidate.name == argument.name)
            });
            match argument_definition {
                Some(expected) => self.check_value(
                    &argument.value,
                    &expected.ty,
                    expected.default_value.is_some(),
                    scope,
                ),
                None => {}
            }
        }
        self.check_directives(&field.directives, scope);

        let mut child_type = None;
        if let Some(definition) = definition {
            let named = definition.ty.inner_named_type();
            match schema.types.get(named) {
                Some(ty) if is_leaf(ty) && !field.selection_set.is_empty() => {
                    self.report(
                        format!(
                            "Field \"{}\" must not have a selection since type \"{}\" has no \
                             subfields.",
                            field.name, definition.ty
                        ),
                        node_offset(field),
                    );
                }
                Some(ty) if is_composite(ty) && field.selection_set.is_empty() => {
                    self.report(
                        format!(
                            "Field \"{name}\" of type \"{}\" must have a selection of subfields. \
                             Did you mean \"{name} {{ ... }}\"?",
                            definition.ty,
                            name = field.name
                        ),
                        node_offset(field),
                    );
                }
                Some(ty) if is_composite(ty) => child_type = Some(named.clone()),
                _ => {}
            }
        }

        self.check_selections(&field.selection_set, child_type.as_ref(), scope);
    }

    fn check_directives(&mut self, directives: &'a ast::DirectiveList, scope: &mut Scope) {
        let schema = self.schema;
        for directive in directives.iter() {
            let definition = schema.directive_definitions.get(&directive.name);
            for argument in &directive.arguments {
                let expected = definition.and_then(|definition| {
                    definition
                        .arguments
                        .iter()
                        .find(|candidate| candidate.name == argument.name)
                });
                match expected {
                    Some(expected) => self.check_value(
                        &argument.value,
                        &expected.ty,
                        expected.default_value.is_some(),
                        scope,
                    ),
                    None => {}
                }
            }
        }
    }

    fn check_value(
        &mut self,
        value: &Node<Value>,
        ty: &Type,
        has_location_default: bool,
        scope: &mut Scope,
    ) {
        let literal: &Value = value;
        match (literal, ty) {
            (Value::Variable(name), _) => scope.usages.push(Usage {
                name: name.clone(),
                location_type: ty.clone(),
                has_location_default,
            }),
            (Value::Null, _) => {
                if ty.is_non_null() {
                    self.report(
                        format!("Expected value of type \"{ty}\", found null."),
                        node_offset(value),
                    );
                }
            }
            (Value::List(items), Type::List(inner) | Type::NonNullList(inner)) => {
                for item in items {
                    self.check_value(item, inner, false, scope);
                }
            }
            // A single value is accepted where a list is expected.
            (_, Type::List(inner) | Type::NonNullList(inner)) => {
                self.check_value(value, inner, false, scope);
            }
            (Value::List(_), Type::Named(_) | Type::NonNullNamed(_)) => {
                if self.schema.types.contains_key(ty.inner_named_type()) {
                    self.report_mismatch(ty, value);
                }
            }
            (Value::Object(fields), Type::Named(named) | Type::NonNullNamed(named)) => {
                self.check_object(value, fields, named, ty, scope);
            }
            (_, Type::Named(named) | Type::NonNullNamed(named)) => {
                self.check_leaf(value, named, ty);
            }
        }
    }

    fn check_object(
        &mut self,
        value: &Node<Value>,
        fields: &[(Name, Node<Value>)],
        named: &Name,
        ty: &Type,
        scope: &mut Scope,
    ) {
        let schema = self.schema;
        let input = match schema.types.get(named) {
            Some(ExtendedType::InputObject(input)) => input,
            Some(_) => {
                self.report_mismatch(ty, value);
                return;
            }
            None => return,
        };

        for (field_name, field_value) in fields {
            match input.fields.get(field_name) {
                Some(definition) => self.check_value(
                    field_value,
                    &definition.ty,
                    definition.default_value.is_some(),
                    scope,
                ),
                None => self.report(
                    format!("Field \"{field_name}\" is not defined by type \"{named}\"."),
                    name_offset(field_name).or_else(|| node_offset(field_value)),
                ),
            }
        }

        for (field_name, definition) in &input.fields {
            let provided = fields.iter().any(|(name, _)| name == field_name);
            if !provided && definition.ty.is_non_null() && definition.default_value.is_none() {
                self.report(
                    format!(
                        "Field \"{named}.{field_name}\" of required type \"{}\" was not provided.",
                        *definition.ty
                    ),
                    node_offset(value),
                );
            }
        }
    }

    fn check_leaf(&mut self, value: &Node<Value>, named: &Name, ty: &Type) {
        let literal: &Value = value;
        let schema = self.schema;
        match schema.types.get(named) {
            Some(ExtendedType::Scalar(_)) => {
                if !scalar_accepts(named.as_str(), literal) {
                    self.report_mismatch(ty, value);
                }
            }
            Some(ExtendedType::Enum(enum_type)) => match literal {
                Value::Enum(variant) if !enum_type.values.contains_key(variant) => {
                    self.report(
                        format!("Value \"{variant}\" does not exist in \"{named}\" enum."),
                        node_offset(value),
                    );
                }
                Value::Enum(_) => {}
                _ => self.report_mismatch(ty, value),
            },
            Some(_) => self.report_mismatch(ty, value),
            None => {}
        }
    }

    fn report_mismatch(&mut self, ty: &Type, value: &Node<Value>) {
        let literal: &Value = value;
        self.report(
            format!("Expected value of type \"{ty}\", found {literal}."),
            node_offset(value),
        );
    }

    /// Variables used by an operation, directly or through spreads of
    /// fragments in the same document, must fit where they are used.
    fn check_variable_positions(
        &mut self,
        operation: &Node<ast::OperationDefinition>,
        scope: &Scope,
        fragment_scopes: &HashMap<&str, Scope>,
    ) {
        let mut usages: Vec<&Usage> = scope.usages.iter().collect();
        let mut visited = HashSet::new();
        let mut stack: Vec<&Name> = scope.spreads.iter().rev().collect();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.as_str()) {
                continue;
            }
            if let Some(fragment_scope) = fragment_scopes.get(name.as_str()) {
                usages.extend(fragment_scope.usages.iter());
                stack.extend(fragment_scope.spreads.iter().rev());
            }
        }

        for usage in usages {
            let Some(variable) = operation
                .variables
                .iter()
                .find(|variable| variable.name == usage.name)
            else {
                continue;
            };
            if !self
                .schema
                .types
                .contains_key(variable.ty.inner_named_type())
            {
                continue;
            }

            let has_non_null_default = variable
                .default_value
                .as_ref()
                .is_some_and(|default| !matches!(**default, Value::Null));

            if !allowed_variable_usage(
                &variable.ty,
                has_non_null_default,
                &usage.location_type,
                usage.has_location_default,
            ) {
                self.report(
                    format!(
                        "Variable \"${}\" of type \"{}\" used in position expecting type \"{}\".",
                        variable.name, *variable.ty, usage.location_type
                    ),
                    node_offset(variable),
                );
            }
        }
    }

    fn is_known_composite(&self, name: &Name) -> bool {
        self.schema.types.get(name).is_some_and(is_composite)
    }

    fn possible_types(&self, name: &Name) -> HashSet<&'a str> {
        let schema = self.schema;
        match schema.types.get(name) {
            Some(ExtendedType::Object(object)) => HashSet::from([object.name.as_str()]),
            Some(ExtendedType::Interface(_)) => schema
                .types
                .iter()
                .filter_map(|(type_name, ty)| match ty {
                    ExtendedType::Object(object)
                        if object
                            .implements_interfaces
                            .iter()
                            .any(|interface| interface.name == *name) =>
                    {
                        Some(type_name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            Some(ExtendedType::Union(union_type)) => union_type
                .members
                .iter()
                .map(|member| member.name.as_str())
                .collect(),
            _ => HashSet::new(),
        }
    }

    /// Whether some object type can be both `a` and `b`.
    fn types_overlap(&self, a: &Name, b: &Name) -> bool {
        if a == b || !self.is_known_composite(b) {
            return true;
        }
        let left = self.possible_types(a);
        let right = self.possible_types(b);
        !left.is_disjoint(&right)
    }
}

const fn is_composite(ty: &ExtendedType) -> bool {
    matches!(
        ty,
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_)
    )
}

const fn is_leaf(ty: &ExtendedType) -> bool {
    matches!(ty, ExtendedType::Scalar(_) | ExtendedType::Enum(_))
}

const fn is_input(ty: &ExtendedType) -> bool {
    matches!(
        ty,
        ExtendedType::Scalar(_) | ExtendedType::Enum(_) | ExtendedType::InputObject(_)
    )
}

fn scalar_accepts(scalar: &str, value: &Value) -> bool {
    match scalar {
        "Int" => matches!(value, Value::Int(int) if int.to_string().parse::<i32>().is_ok()),
        "Float" => matches!(value, Value::Int(_) | Value::Float(_)),
        "String" => matches!(value, Value::String(_)),
        "Boolean" => matches!(value, Value::Boolean(_)),
        "ID" => matches!(value, Value::String(_) | Value::Int(_)),
        // Custom scalars accept any literal.
        _ => true,
    }
}

fn nullable(ty: &Type) -> Type {
    match ty {
        Type::NonNullNamed(named) => Type::Named(named.clone()),
        Type::NonNullList(inner) => Type::List(inner.clone()),
        other => other.clone(),
    }
}

fn allowed_variable_usage(
    variable_type: &Type,
    has_non_null_default: bool,
    location_type: &Type,
    has_location_default: bool,
) -> bool {
    if location_type.is_non_null() && !variable_type.is_non_null() {
        if !has_non_null_default && !has_location_default {
            return false;
        }
        return is_subtype(variable_type, &nullable(location_type));
    }
    is_subtype(variable_type, location_type)
}

/// Input-type subtyping: only nullability and list wrapping vary.
fn is_subtype(sub: &Type, sup: &Type) -> bool {
    if sub == sup {
        return true;
    }
    if sup.is_non_null() {
        return sub.is_non_null() && is_subtype(&nullable(sub), &nullable(sup));
    }
    if sub.is_non_null() {
        return is_subtype(&nullable(sub), sup);
    }
    match (sub, sup) {
        (Type::List(sub_inner), Type::List(sup_inner)) => is_subtype(sub_inner, sup_inner),
        _ => false,
    }
}

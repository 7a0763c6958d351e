//! The [`SyntaxTree`] arena.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::attrs::{AttributeValue, Attributes};
use super::decl::{
    ClassDecl, ConstructorDecl, EnumDecl, InterfaceDecl, MethodDecl, ParameterDecl, SourceFileDecl,
};
use super::ids::{
    CallableId, ClassId, ConstructorId, EnumId, EnumMemberId, FieldId, FileId, ImportId,
    InterfaceId, MethodId, MethodOwner, NameMap, NodeRef, ParameterId, PropertyId,
};
use super::nodes::{
    Class, Constructor, Enum, EnumMember, Field, Import, Interface, Method, MethodParameter,
    Property, SourceFile,
};
use crate::error::{CoreError, CoreResult};

fn unknown(kind: &'static str, id: impl std::fmt::Display) -> CoreError {
    CoreError::UnknownNode {
        kind,
        id: id.to_string(),
    }
}

/// Arena owning every declaration of every inserted source file.
///
/// Ids are issued monotonically and never reused, so a handle held across
/// [`remove_source_file`](SyntaxTree::remove_source_file) resolves to
/// `UnknownNode` rather than to an unrelated node.
#[derive(Debug, Default)]
pub struct SyntaxTree {
    files: BTreeMap<FileId, SourceFile>,
    imports: BTreeMap<ImportId, Import>,
    enums: BTreeMap<EnumId, Enum>,
    enum_members: BTreeMap<EnumMemberId, EnumMember>,
    interfaces: BTreeMap<InterfaceId, Interface>,
    classes: BTreeMap<ClassId, Class>,
    fields: BTreeMap<FieldId, Field>,
    properties: BTreeMap<PropertyId, Property>,
    constructors: BTreeMap<ConstructorId, Constructor>,
    methods: BTreeMap<MethodId, Method>,
    parameters: BTreeMap<ParameterId, MethodParameter>,

    file_by_path: HashMap<String, FileId>,

    next_file_id: u32,
    next_import_id: u32,
    next_enum_id: u32,
    next_enum_member_id: u32,
    next_interface_id: u32,
    next_class_id: u32,
    next_field_id: u32,
    next_property_id: u32,
    next_constructor_id: u32,
    next_method_id: u32,
    next_parameter_id: u32,
}

macro_rules! next_id {
    ($fn_name:ident, $counter:ident, $ty:ident) => {
        fn $fn_name(&mut self) -> $ty {
            let id = $ty::new(self.$counter);
            self.$counter += 1;
            id
        }
    };
}

impl SyntaxTree {
    pub fn new() -> Self {
        SyntaxTree::default()
    }

    next_id!(next_file_id, next_file_id, FileId);
    next_id!(next_import_id, next_import_id, ImportId);
    next_id!(next_enum_id, next_enum_id, EnumId);
    next_id!(next_enum_member_id, next_enum_member_id, EnumMemberId);
    next_id!(next_interface_id, next_interface_id, InterfaceId);
    next_id!(next_class_id, next_class_id, ClassId);
    next_id!(next_field_id, next_field_id, FieldId);
    next_id!(next_property_id, next_property_id, PropertyId);
    next_id!(next_constructor_id, next_constructor_id, ConstructorId);
    next_id!(next_method_id, next_method_id, MethodId);
    next_id!(next_parameter_id, next_parameter_id, ParameterId);

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Validate and insert a whole compilation unit.
    ///
    /// Nothing is inserted when validation fails. A path may be inserted
    /// only once.
    pub fn insert_source_file(&mut self, decl: SourceFileDecl) -> CoreResult<FileId> {
        if self.file_by_path.contains_key(&decl.path) {
            return Err(CoreError::duplicate("source file", decl.path, "tree"));
        }
        decl.validate()?;

        let file_id = self.next_file_id();
        let SourceFileDecl {
            path,
            imports,
            enums,
            interfaces,
            classes,
            main,
        } = decl;

        let mut file = SourceFile {
            file_id,
            path: path.clone(),
            imports: Vec::with_capacity(imports.len()),
            interfaces: NameMap::new(),
            classes: NameMap::new(),
            enums: NameMap::new(),
            main,
        };

        for import in imports {
            let import_id = self.next_import_id();
            self.imports.insert(
                import_id,
                Import {
                    import_id,
                    file_id,
                    package: import.package,
                    symbol: import.symbol,
                    leading_trivia: import.leading_trivia,
                    attributes: import.attributes,
                },
            );
            file.imports.push(import_id);
        }
        for decl in enums {
            let name = decl.name.clone();
            let enum_id = self.insert_enum(file_id, decl);
            file.enums.push(name, enum_id);
        }
        for decl in interfaces {
            let name = decl.name.clone();
            let interface_id = self.insert_interface(file_id, decl);
            file.interfaces.push(name, interface_id);
        }
        for decl in classes {
            let name = decl.name.clone();
            let class_id = self.insert_class(file_id, decl);
            file.classes.push(name, class_id);
        }

        debug!(
            file = %file_id,
            path = %path,
            classes = file.classes.len(),
            interfaces = file.interfaces.len(),
            enums = file.enums.len(),
            "inserted source file"
        );
        self.file_by_path.insert(path, file_id);
        self.files.insert(file_id, file);
        Ok(file_id)
    }

    fn insert_enum(&mut self, file_id: FileId, decl: EnumDecl) -> EnumId {
        let enum_id = self.next_enum_id();
        let mut members = NameMap::new();
        for name in decl.members {
            let member_id = self.next_enum_member_id();
            self.enum_members.insert(
                member_id,
                EnumMember {
                    member_id,
                    enum_id,
                    name: name.clone(),
                },
            );
            members.push(name, member_id);
        }
        self.enums.insert(
            enum_id,
            Enum {
                enum_id,
                file_id,
                name: decl.name,
                members,
                leading_trivia: decl.leading_trivia,
                attributes: decl.attributes,
            },
        );
        enum_id
    }

    fn insert_interface(&mut self, file_id: FileId, decl: InterfaceDecl) -> InterfaceId {
        let interface_id = self.next_interface_id();
        let mut methods = NameMap::new();
        for method in decl.methods {
            let name = method.name.clone();
            let method_id = self.insert_method(MethodOwner::Interface(interface_id), method);
            methods.push(name, method_id);
        }
        self.interfaces.insert(
            interface_id,
            Interface {
                interface_id,
                file_id,
                name: decl.name,
                type_arguments: decl.type_arguments,
                base_interfaces: decl.base_interfaces,
                methods,
                leading_trivia: decl.leading_trivia,
                attributes: decl.attributes,
            },
        );
        interface_id
    }

    fn insert_class(&mut self, file_id: FileId, decl: ClassDecl) -> ClassId {
        let class_id = self.next_class_id();

        let mut fields = NameMap::new();
        for field in decl.fields {
            let field_id = self.next_field_id();
            fields.push(field.name.clone(), field_id);
            self.fields.insert(
                field_id,
                Field {
                    field_id,
                    class_id,
                    name: field.name,
                    ty: field.ty,
                    initializer: field.initializer,
                    visibility: field.visibility,
                    is_static: field.is_static,
                    leading_trivia: field.leading_trivia,
                    attributes: field.attributes,
                },
            );
        }

        let mut properties = NameMap::new();
        for property in decl.properties {
            let property_id = self.next_property_id();
            properties.push(property.name.clone(), property_id);
            self.properties.insert(
                property_id,
                Property {
                    property_id,
                    class_id,
                    name: property.name,
                    ty: property.ty,
                    getter: property.getter,
                    setter: property.setter,
                    visibility: property.visibility,
                    is_static: property.is_static,
                    leading_trivia: property.leading_trivia,
                    attributes: property.attributes,
                },
            );
        }

        let constructor = decl
            .constructor
            .map(|ctor| self.insert_constructor(class_id, ctor));

        let mut methods = NameMap::new();
        for method in decl.methods {
            let name = method.name.clone();
            let method_id = self.insert_method(MethodOwner::Class(class_id), method);
            methods.push(name, method_id);
        }

        self.classes.insert(
            class_id,
            Class {
                class_id,
                file_id,
                name: decl.name,
                type_arguments: decl.type_arguments,
                base_class: decl.base_class,
                base_interfaces: decl.base_interfaces,
                fields,
                properties,
                constructor,
                methods,
                leading_trivia: decl.leading_trivia,
                attributes: decl.attributes,
            },
        );
        class_id
    }

    fn insert_constructor(&mut self, class_id: ClassId, decl: ConstructorDecl) -> ConstructorId {
        let constructor_id = self.next_constructor_id();
        let parameters =
            self.insert_parameters(CallableId::Constructor(constructor_id), decl.parameters);
        self.constructors.insert(
            constructor_id,
            Constructor {
                constructor_id,
                class_id,
                parameters,
                body: decl.body,
                throws: decl.throws,
                leading_trivia: decl.leading_trivia,
                attributes: decl.attributes,
            },
        );
        constructor_id
    }

    fn insert_method(&mut self, owner: MethodOwner, decl: MethodDecl) -> MethodId {
        let method_id = self.next_method_id();
        let parameters = self.insert_parameters(CallableId::Method(method_id), decl.parameters);
        self.methods.insert(
            method_id,
            Method {
                method_id,
                owner,
                name: decl.name,
                type_arguments: decl.type_arguments,
                parameters,
                returns: decl.returns,
                body: decl.body,
                visibility: decl.visibility,
                is_static: decl.is_static,
                throws: decl.throws,
                mutates: decl.mutates,
                leading_trivia: decl.leading_trivia,
                attributes: decl.attributes,
            },
        );
        method_id
    }

    fn insert_parameters(
        &mut self,
        callable: CallableId,
        decls: Vec<ParameterDecl>,
    ) -> Vec<ParameterId> {
        decls
            .into_iter()
            .map(|param| {
                let parameter_id = self.next_parameter_id();
                self.parameters.insert(
                    parameter_id,
                    MethodParameter {
                        parameter_id,
                        callable,
                        name: param.name,
                        ty: param.ty,
                        default: param.default,
                    },
                );
                parameter_id
            })
            .collect()
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove a file and every declaration it owns.
    ///
    /// Walks child lists only; back-references are never followed.
    pub fn remove_source_file(&mut self, file_id: FileId) -> CoreResult<SourceFile> {
        let file = self
            .files
            .remove(&file_id)
            .ok_or_else(|| unknown("file", file_id))?;
        self.file_by_path.remove(&file.path);

        for import_id in &file.imports {
            self.imports.remove(import_id);
        }
        for enum_id in file.enums.ids() {
            if let Some(e) = self.enums.remove(&enum_id) {
                for member_id in e.members.ids() {
                    self.enum_members.remove(&member_id);
                }
            }
        }
        for interface_id in file.interfaces.ids() {
            if let Some(iface) = self.interfaces.remove(&interface_id) {
                for method_id in iface.methods.ids() {
                    self.remove_method(method_id);
                }
            }
        }
        for class_id in file.classes.ids() {
            if let Some(class) = self.classes.remove(&class_id) {
                for field_id in class.fields.ids() {
                    self.fields.remove(&field_id);
                }
                for property_id in class.properties.ids() {
                    self.properties.remove(&property_id);
                }
                if let Some(ctor_id) = class.constructor {
                    if let Some(ctor) = self.constructors.remove(&ctor_id) {
                        for param_id in &ctor.parameters {
                            self.parameters.remove(param_id);
                        }
                    }
                }
                for method_id in class.methods.ids() {
                    self.remove_method(method_id);
                }
            }
        }

        debug!(file = %file_id, path = %file.path, "removed source file");
        Ok(file)
    }

    fn remove_method(&mut self, method_id: MethodId) {
        if let Some(method) = self.methods.remove(&method_id) {
            for param_id in &method.parameters {
                self.parameters.remove(param_id);
            }
        }
    }

    // ========================================================================
    // Lookup by Id
    // ========================================================================

    pub fn file(&self, id: FileId) -> CoreResult<&SourceFile> {
        self.files.get(&id).ok_or_else(|| unknown("file", id))
    }

    pub fn import(&self, id: ImportId) -> CoreResult<&Import> {
        self.imports.get(&id).ok_or_else(|| unknown("import", id))
    }

    pub fn enumeration(&self, id: EnumId) -> CoreResult<&Enum> {
        self.enums.get(&id).ok_or_else(|| unknown("enum", id))
    }

    pub fn enum_member(&self, id: EnumMemberId) -> CoreResult<&EnumMember> {
        self.enum_members
            .get(&id)
            .ok_or_else(|| unknown("enum member", id))
    }

    pub fn interface(&self, id: InterfaceId) -> CoreResult<&Interface> {
        self.interfaces
            .get(&id)
            .ok_or_else(|| unknown("interface", id))
    }

    pub fn class(&self, id: ClassId) -> CoreResult<&Class> {
        self.classes.get(&id).ok_or_else(|| unknown("class", id))
    }

    pub fn field(&self, id: FieldId) -> CoreResult<&Field> {
        self.fields.get(&id).ok_or_else(|| unknown("field", id))
    }

    pub fn property(&self, id: PropertyId) -> CoreResult<&Property> {
        self.properties
            .get(&id)
            .ok_or_else(|| unknown("property", id))
    }

    pub fn constructor(&self, id: ConstructorId) -> CoreResult<&Constructor> {
        self.constructors
            .get(&id)
            .ok_or_else(|| unknown("constructor", id))
    }

    pub fn method(&self, id: MethodId) -> CoreResult<&Method> {
        self.methods.get(&id).ok_or_else(|| unknown("method", id))
    }

    pub fn parameter(&self, id: ParameterId) -> CoreResult<&MethodParameter> {
        self.parameters
            .get(&id)
            .ok_or_else(|| unknown("parameter", id))
    }

    /// Parameters of a constructor or method, in declaration order.
    pub fn parameters_of(&self, callable: CallableId) -> CoreResult<Vec<&MethodParameter>> {
        let ids = match callable {
            CallableId::Constructor(id) => &self.constructor(id)?.parameters,
            CallableId::Method(id) => &self.method(id)?.parameters,
        };
        ids.iter().map(|id| self.parameter(*id)).collect()
    }

    // ========================================================================
    // Lookup by Name
    // ========================================================================

    pub fn file_by_path(&self, path: &str) -> Option<&SourceFile> {
        self.file_by_path.get(path).and_then(|id| self.files.get(id))
    }

    pub fn class_by_name(&self, file_id: FileId, name: &str) -> CoreResult<Option<&Class>> {
        let file = self.file(file_id)?;
        file.classes.get(name).map(|id| self.class(id)).transpose()
    }

    pub fn interface_by_name(&self, file_id: FileId, name: &str) -> CoreResult<Option<&Interface>> {
        let file = self.file(file_id)?;
        file.interfaces
            .get(name)
            .map(|id| self.interface(id))
            .transpose()
    }

    pub fn enum_by_name(&self, file_id: FileId, name: &str) -> CoreResult<Option<&Enum>> {
        let file = self.file(file_id)?;
        file.enums
            .get(name)
            .map(|id| self.enumeration(id))
            .transpose()
    }

    /// Find a class by name across every file, in file order.
    pub fn find_class(&self, name: &str) -> Option<&Class> {
        self.files
            .values()
            .find_map(|file| file.classes.get(name))
            .and_then(|id| self.classes.get(&id))
    }

    pub fn field_by_name(&self, class_id: ClassId, name: &str) -> CoreResult<Option<&Field>> {
        let class = self.class(class_id)?;
        class.fields.get(name).map(|id| self.field(id)).transpose()
    }

    pub fn property_by_name(&self, class_id: ClassId, name: &str) -> CoreResult<Option<&Property>> {
        let class = self.class(class_id)?;
        class
            .properties
            .get(name)
            .map(|id| self.property(id))
            .transpose()
    }

    pub fn method_by_name(&self, owner: MethodOwner, name: &str) -> CoreResult<Option<&Method>> {
        let methods = match owner {
            MethodOwner::Class(id) => &self.class(id)?.methods,
            MethodOwner::Interface(id) => &self.interface(id)?.methods,
        };
        methods.get(name).map(|id| self.method(id)).transpose()
    }

    // ========================================================================
    // Owner Navigation
    // ========================================================================

    pub fn file_of_class(&self, id: ClassId) -> CoreResult<&SourceFile> {
        self.file(self.class(id)?.file_id)
    }

    pub fn file_of_interface(&self, id: InterfaceId) -> CoreResult<&SourceFile> {
        self.file(self.interface(id)?.file_id)
    }

    pub fn file_of_enum(&self, id: EnumId) -> CoreResult<&SourceFile> {
        self.file(self.enumeration(id)?.file_id)
    }

    pub fn file_of_import(&self, id: ImportId) -> CoreResult<&SourceFile> {
        self.file(self.import(id)?.file_id)
    }

    pub fn enum_of_member(&self, id: EnumMemberId) -> CoreResult<&Enum> {
        self.enumeration(self.enum_member(id)?.enum_id)
    }

    pub fn class_of_field(&self, id: FieldId) -> CoreResult<&Class> {
        self.class(self.field(id)?.class_id)
    }

    pub fn class_of_property(&self, id: PropertyId) -> CoreResult<&Class> {
        self.class(self.property(id)?.class_id)
    }

    pub fn class_of_constructor(&self, id: ConstructorId) -> CoreResult<&Class> {
        self.class(self.constructor(id)?.class_id)
    }

    /// Owning class of a method; `None` for interface methods.
    pub fn class_of_method(&self, id: MethodId) -> CoreResult<Option<&Class>> {
        match self.method(id)?.owner {
            MethodOwner::Class(class_id) => self.class(class_id).map(Some),
            MethodOwner::Interface(_) => Ok(None),
        }
    }

    pub fn callable_of_parameter(&self, id: ParameterId) -> CoreResult<CallableId> {
        Ok(self.parameter(id)?.callable)
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values()
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    /// Every callable of a class: the constructor first, then methods.
    pub fn callables_of(&self, class_id: ClassId) -> CoreResult<Vec<CallableId>> {
        Ok(self.class(class_id)?.callables().collect())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    // ========================================================================
    // Annotation
    // ========================================================================

    fn annotated_mut(&mut self, node: NodeRef) -> CoreResult<(&mut String, &mut Attributes)> {
        macro_rules! parts {
            ($table:ident, $id:expr, $kind:literal) => {
                self.$table
                    .get_mut(&$id)
                    .map(|n| (&mut n.leading_trivia, &mut n.attributes))
                    .ok_or_else(|| unknown($kind, $id))
            };
        }
        match node {
            NodeRef::Import(id) => parts!(imports, id, "import"),
            NodeRef::Enum(id) => parts!(enums, id, "enum"),
            NodeRef::Interface(id) => parts!(interfaces, id, "interface"),
            NodeRef::Class(id) => parts!(classes, id, "class"),
            NodeRef::Field(id) => parts!(fields, id, "field"),
            NodeRef::Property(id) => parts!(properties, id, "property"),
            NodeRef::Constructor(id) => parts!(constructors, id, "constructor"),
            NodeRef::Method(id) => parts!(methods, id, "method"),
        }
    }

    /// Mutable attribute bag of any annotated declaration.
    pub fn attributes_mut(&mut self, node: NodeRef) -> CoreResult<&mut Attributes> {
        Ok(self.annotated_mut(node)?.1)
    }

    pub fn set_attribute(
        &mut self,
        node: NodeRef,
        name: impl Into<String>,
        value: AttributeValue,
    ) -> CoreResult<()> {
        self.attributes_mut(node)?.set(name, value);
        Ok(())
    }

    /// Replace the comments and whitespace preceding a declaration.
    pub fn set_leading_trivia(
        &mut self,
        node: NodeRef,
        trivia: impl Into<String>,
    ) -> CoreResult<()> {
        *self.annotated_mut(node)?.0 = trivia.into();
        Ok(())
    }

    /// Flag a constructor or method as possibly failing.
    pub fn mark_throws(&mut self, callable: CallableId) -> CoreResult<()> {
        match callable {
            CallableId::Constructor(id) => {
                self.constructors
                    .get_mut(&id)
                    .ok_or_else(|| unknown("constructor", id))?
                    .throws = true;
            }
            CallableId::Method(id) => {
                self.methods
                    .get_mut(&id)
                    .ok_or_else(|| unknown("method", id))?
                    .throws = true;
            }
        }
        Ok(())
    }

    /// Flag a method as mutating its receiver.
    pub fn mark_mutates(&mut self, id: MethodId) -> CoreResult<()> {
        self.methods
            .get_mut(&id)
            .ok_or_else(|| unknown("method", id))?
            .mutates = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{
        Block, Expression, FieldDecl, HasAttributesAndTrivia, HasCallableShape,
        HasInterfaceShape, ImportDecl, PropertyDecl, Statement, TypeRef, Variable,
    };

    fn number() -> TypeRef {
        TypeRef::class("number")
    }

    fn sample() -> SourceFileDecl {
        let add = MethodDecl::signature(
            "add",
            vec![ParameterDecl::new("x", number())],
            TypeRef::Void,
        )
        .with_body(Block::new(vec![Statement::expr(Expression::ident("x"))]));

        SourceFileDecl::new("shapes.ts")
            .import(ImportDecl::new("./geom", "Point"))
            .enumeration(EnumDecl::new("Kind", ["Circle", "Square"]))
            .interface(InterfaceDecl::new("Shape").method(MethodDecl::signature(
                "area",
                vec![],
                number(),
            )))
            .class(
                ClassDecl::new("Circle")
                    .field(FieldDecl::new("radius", number()))
                    .field(FieldDecl::new("count", number()).with_static())
                    .property(PropertyDecl::new("diameter", number()).with_getter(Block::default()))
                    .constructor(ConstructorDecl::new(
                        vec![ParameterDecl::new("radius", number())],
                        Block::default(),
                    ))
                    .method(add),
            )
    }

    mod construction {
        use super::*;

        #[test]
        fn back_references_point_at_owners() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(sample()).unwrap();

            let class = tree.class_by_name(file_id, "Circle").unwrap().unwrap();
            assert_eq!(class.file_id, file_id);
            assert_eq!(tree.file_of_class(class.class_id).unwrap().path, "shapes.ts");

            let method = tree
                .method_by_name(MethodOwner::Class(class.class_id), "add")
                .unwrap()
                .unwrap();
            assert_eq!(
                tree.class_of_method(method.method_id).unwrap().unwrap().name,
                "Circle"
            );

            let param = tree.parameter(method.parameters[0]).unwrap();
            assert_eq!(param.callable, CallableId::Method(method.method_id));
            assert_eq!(param.name(), "x");

            let field = tree.field_by_name(class.class_id, "count").unwrap().unwrap();
            assert!(field.is_static);
            assert_eq!(tree.class_of_field(field.field_id).unwrap().class_id, class.class_id);
        }

        #[test]
        fn interface_methods_have_no_class() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(sample()).unwrap();
            let iface = tree.interface_by_name(file_id, "Shape").unwrap().unwrap();
            let area = iface.methods().get("area").unwrap();
            assert!(tree.class_of_method(area).unwrap().is_none());
            assert!(tree.method(area).unwrap().body().is_none());
        }

        #[test]
        fn enum_members_keep_order() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(sample()).unwrap();
            let kind = tree.enum_by_name(file_id, "Kind").unwrap().unwrap();
            assert_eq!(kind.members.names().collect::<Vec<_>>(), vec!["Circle", "Square"]);
            let square = kind.members.get("Square").unwrap();
            assert_eq!(tree.enum_of_member(square).unwrap().name, "Kind");
        }

        #[test]
        fn callables_list_constructor_first() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(sample()).unwrap();
            let class = tree.class_by_name(file_id, "Circle").unwrap().unwrap();
            let callables = tree.callables_of(class.class_id).unwrap();
            assert_eq!(callables.len(), 2);
            assert!(matches!(callables[0], CallableId::Constructor(_)));
            let params = tree.parameters_of(callables[0]).unwrap();
            assert_eq!(params[0].name, "radius");
        }

        #[test]
        fn duplicate_member_inserts_nothing() {
            let mut tree = SyntaxTree::new();
            let decl = SourceFileDecl::new("bad.ts")
                .class(ClassDecl::new("Ok").field(FieldDecl::new("a", number())))
                .class(
                    ClassDecl::new("Bad")
                        .field(FieldDecl::new("x", number()))
                        .property(PropertyDecl::new("x", number())),
                );
            let err = tree.insert_source_file(decl).unwrap_err();
            assert!(matches!(err, CoreError::DuplicateDeclaration { .. }));
            assert_eq!(tree.file_count(), 0);
            assert_eq!(tree.class_count(), 0);
            assert!(tree.find_class("Ok").is_none());
        }

        #[test]
        fn same_path_twice_rejected() {
            let mut tree = SyntaxTree::new();
            tree.insert_source_file(SourceFileDecl::new("a.ts")).unwrap();
            let err = tree.insert_source_file(SourceFileDecl::new("a.ts")).unwrap_err();
            assert_eq!(err.to_string(), "duplicate source file 'a.ts' in tree");
        }
    }

    mod annotation {
        use super::*;

        #[test]
        fn set_attribute_and_trivia() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(sample()).unwrap();
            let import_id = tree.file(file_id).unwrap().imports[0];

            tree.set_attribute(NodeRef::Import(import_id), "resolved", AttributeValue::Flag(true))
                .unwrap();
            tree.set_leading_trivia(NodeRef::Import(import_id), "// geometry\n")
                .unwrap();

            let import = tree.import(import_id).unwrap();
            assert!(import.attributes().has("resolved"));
            assert_eq!(import.leading_trivia(), "// geometry\n");
        }

        #[test]
        fn mark_throws_and_mutates() {
            let mut tree = SyntaxTree::new();
            let file_id = tree.insert_source_file(sample()).unwrap();
            let class_id = tree.class_by_name(file_id, "Circle").unwrap().unwrap().class_id;
            let add = tree.class(class_id).unwrap().methods.get("add").unwrap();
            let ctor = tree.class(class_id).unwrap().constructor.unwrap();

            tree.mark_throws(CallableId::Constructor(ctor)).unwrap();
            tree.mark_mutates(add).unwrap();

            assert!(tree.constructor(ctor).unwrap().throws());
            assert!(tree.method(add).unwrap().mutates);
            assert!(!tree.method(add).unwrap().throws());
        }

        #[test]
        fn unknown_handle_is_an_error() {
            let mut tree = SyntaxTree::new();
            let err = tree.mark_mutates(MethodId::new(42)).unwrap_err();
            assert_eq!(err.to_string(), "unknown method method_42");
        }
    }

    mod removal {
        use super::*;

        #[test]
        fn remove_file_drops_owned_nodes() {
            let mut tree = SyntaxTree::new();
            let keep = tree
                .insert_source_file(
                    SourceFileDecl::new("keep.ts").class(ClassDecl::new("Keep").method(
                        MethodDecl::signature(
                            "m",
                            vec![ParameterDecl::new("p", number())],
                            TypeRef::Void,
                        ),
                    )),
                )
                .unwrap();
            let gone = tree.insert_source_file(sample()).unwrap();
            let circle = tree.class_by_name(gone, "Circle").unwrap().unwrap().class_id;

            let removed = tree.remove_source_file(gone).unwrap();
            assert_eq!(removed.path, "shapes.ts");

            assert!(tree.file(gone).is_err());
            assert!(tree.class(circle).is_err());
            assert!(tree.file_by_path("shapes.ts").is_none());
            assert_eq!(tree.class_count(), 1);
            assert_eq!(tree.method_count(), 1);
            assert_eq!(tree.parameter_count(), 1);
            assert!(tree.file(keep).is_ok());
        }

        #[test]
        fn ids_are_not_reused() {
            let mut tree = SyntaxTree::new();
            let first = tree.insert_source_file(SourceFileDecl::new("a.ts")).unwrap();
            tree.remove_source_file(first).unwrap();
            let second = tree.insert_source_file(SourceFileDecl::new("a.ts")).unwrap();
            assert_ne!(first, second);
        }
    }

    #[test]
    fn class_shape_through_trait() {
        let mut tree = SyntaxTree::new();
        let file_id = tree.insert_source_file(sample()).unwrap();
        let class = tree.class_by_name(file_id, "Circle").unwrap().unwrap();
        let shape: &dyn HasInterfaceShape = class;
        assert_eq!(shape.name(), "Circle");
        assert_eq!(shape.methods().len(), 1);
        assert!(shape.base_interfaces().is_empty());
    }
}

//! Global type information: class tables, function signatures and the
//! inheritance forest.
//!
//! Built once between parsing and type checking. Holds indices into the
//! program tree rather than references, so the checker can keep mutating
//! the tree while the tables stay live.

use std::collections::{HashMap, HashSet};

use latc_parser::{ClassDecl, Function, Param, Program, Span, Type};
use thiserror::Error;

use crate::builtins::{BUILTIN_FUNCTIONS, MAIN_FUN};

/// One accumulated semantic error with an inclusive byte range.
#[derive(Debug, Clone)]
pub struct TypeError {
    pub begin: usize,
    pub end: usize,
    pub msg: String,
}

impl TypeError {
    pub fn at(begin: usize, end: usize, msg: impl Into<String>) -> Self {
        Self {
            begin,
            end,
            msg: msg.into(),
        }
    }

    pub fn spanned(span: Span, msg: impl Into<String>) -> Self {
        let end = if span.end > span.start {
            span.end - 1
        } else {
            span.end
        };
        Self::at(span.start, end, msg)
    }

    /// Positionless errors (e.g. missing `main`) render as `endfile`.
    pub fn sentinel(msg: impl Into<String>) -> Self {
        Self::at(usize::MAX, usize::MAX, msg)
    }
}

/// The batch of semantic errors a compilation run accumulated.
#[derive(Error, Debug)]
#[error("{} type error(s)", .0.len())]
pub struct TypeErrors(pub Vec<TypeError>);

pub type NodeId = usize;

/// Inheritance forest as an arena: parent ids up, child lists down.
#[derive(Debug, Default)]
pub struct InheritanceForest {
    nodes: Vec<ForestNode>,
    roots: Vec<NodeId>,
}

#[derive(Debug)]
pub struct ForestNode {
    pub class: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl InheritanceForest {
    pub fn add_root(&mut self, class: impl Into<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ForestNode {
            class: class.into(),
            parent: None,
            children: Vec::new(),
        });
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, class: impl Into<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ForestNode {
            class: class.into(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &ForestNode {
        &self.nodes[id]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }
}

/// A virtual method occupying one vtable slot.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    /// Class that defines this slot's implementation
    pub owner: String,
    /// Index of the owner in `program.classes`
    pub class_idx: usize,
    /// Index of the body in the owner's `methods`
    pub method_idx: usize,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub dec_span: Span,
}

#[derive(Debug)]
pub struct ClassInfo {
    /// Index into `program.classes`
    pub class_idx: usize,
    pub node: NodeId,
    /// All fields, inherited first, in declaration order
    pub fields: Vec<(Type, String)>,
    pub field_ids: HashMap<String, usize>,
    /// All virtual methods in slot order; overrides keep the parent slot
    pub methods: Vec<MethodInfo>,
    pub method_slots: HashMap<String, usize>,
}

#[derive(Debug)]
pub struct FunctionInfo {
    /// Index into `program.functions`
    pub fn_idx: usize,
    pub return_type: Type,
    pub params: Vec<Param>,
}

#[derive(Debug)]
pub struct TypeInfo {
    pub classes: HashMap<String, ClassInfo>,
    pub functions: HashMap<String, FunctionInfo>,
    pub forest: InheritanceForest,
}

impl TypeInfo {
    /// Is `sub` the class `ancestor` or one of its descendants?
    pub fn is_subclass(&self, sub: &str, ancestor: &str) -> bool {
        let Some(info) = self.classes.get(sub) else {
            return false;
        };
        let mut node = Some(info.node);
        while let Some(id) = node {
            if self.forest.node(id).class == ancestor {
                return true;
            }
            node = self.forest.node(id).parent;
        }
        false
    }

    /// Implicit casts: identity, `null` to any class, subclass to
    /// ancestor, and arrays covariantly over their element type.
    pub fn casts_implicitly(&self, from: &Type, to: &Type) -> bool {
        if from == to {
            return true;
        }
        match (from, to) {
            (Type::Array(a), Type::Array(b)) => self.casts_implicitly(a, b),
            (Type::Null, Type::Class(c)) => self.classes.contains_key(c),
            (Type::Class(c), Type::Class(p)) => self.is_subclass(c, p),
            _ => false,
        }
    }

    /// Explicit casts run in either direction of the implicit relation.
    pub fn casts_explicitly(&self, from: &Type, to: &Type) -> bool {
        self.casts_implicitly(from, to) || self.casts_implicitly(to, from)
    }

    /// Is `ty` a usable declared type (class or predefined)?
    pub fn is_known_type(&self, ty: &Type, with_void: bool) -> bool {
        let base = match ty {
            Type::Array(elem) => elem,
            other => other,
        };
        match base {
            Type::Void => with_void && !ty.is_array(),
            Type::Int | Type::Bool | Type::Str => true,
            Type::Class(name) => self.classes.contains_key(name),
            _ => false,
        }
    }
}

/// Build the [`TypeInfo`] tables for a freshly-parsed program.
///
/// Unknown superclasses and inheritance cycles abort immediately; every
/// other structural fault accumulates and the batch is returned at the
/// end.
pub fn build_type_info(program: &Program) -> Result<TypeInfo, TypeErrors> {
    let mut builder = InfoBuilder::new(program);
    builder.gather_class_names();
    builder.build_inheritance_forest()?;
    builder.gather_functions();
    builder.gather_class_variables();
    builder.gather_class_methods();
    builder.finish()
}

struct OwnField {
    name: String,
    ty: Type,
    span: Span,
}

struct InfoBuilder<'a> {
    program: &'a Program,
    errors: Vec<TypeError>,
    classes: HashMap<String, ClassInfo>,
    functions: HashMap<String, FunctionInfo>,
    forest: InheritanceForest,
    own_fields: HashMap<String, Vec<OwnField>>,
    own_methods: HashMap<String, Vec<MethodInfo>>,
}

impl<'a> InfoBuilder<'a> {
    fn new(program: &'a Program) -> Self {
        Self {
            program,
            errors: Vec::new(),
            classes: HashMap::new(),
            functions: HashMap::new(),
            forest: InheritanceForest::default(),
            own_fields: HashMap::new(),
            own_methods: HashMap::new(),
        }
    }

    fn push_error(&mut self, span: Span, msg: impl Into<String>) {
        self.errors.push(TypeError::spanned(span, msg));
    }

    fn is_known_type(&self, ty: &Type, with_void: bool) -> bool {
        let base = match ty {
            Type::Array(elem) => elem.as_ref(),
            other => other,
        };
        match base {
            Type::Void => with_void && !ty.is_array(),
            Type::Int | Type::Bool | Type::Str => true,
            Type::Class(name) => self.classes.contains_key(name),
            _ => false,
        }
    }

    fn gather_class_names(&mut self) {
        let program = self.program;
        for (idx, class) in program.classes.iter().enumerate() {
            let mut add = true;
            if matches!(class.name.as_str(), "int" | "string" | "boolean" | "void") {
                self.push_error(
                    class.dec_span,
                    format!("Class name {} already used by a builtin type.", class.name),
                );
                add = false;
            }
            if self.classes.contains_key(&class.name) {
                self.push_error(
                    class.dec_span,
                    format!("Redefinition of the class {}.", class.name),
                );
                add = false;
            }
            if add {
                self.classes.insert(
                    class.name.clone(),
                    ClassInfo {
                        class_idx: idx,
                        node: usize::MAX,
                        fields: Vec::new(),
                        field_ids: HashMap::new(),
                        methods: Vec::new(),
                        method_slots: HashMap::new(),
                    },
                );
            }
        }
    }

    fn build_inheritance_forest(&mut self) -> Result<(), TypeErrors> {
        let program = self.program;
        let mut unknown_super = false;
        for class in &program.classes {
            if let Some(superclass) = &class.superclass {
                if !self.classes.contains_key(superclass) {
                    unknown_super = true;
                    self.push_error(
                        class.dec_span,
                        format!(
                            "Class {} extends a non-existent class {}.",
                            class.name, superclass
                        ),
                    );
                }
            }
        }
        if unknown_super {
            return Err(TypeErrors(std::mem::take(&mut self.errors)));
        }
        for class in &program.classes {
            if !self.classes.contains_key(&class.name) {
                continue;
            }
            let mut stack = HashSet::new();
            self.build_forest_node(&class.name, &mut stack)?;
        }
        Ok(())
    }

    fn build_forest_node(
        &mut self,
        name: &str,
        stack: &mut HashSet<String>,
    ) -> Result<NodeId, TypeErrors> {
        if let Some(info) = self.classes.get(name) {
            if info.node != usize::MAX {
                return Ok(info.node);
            }
        }
        let class = self.class_decl(name);
        if stack.contains(name) {
            self.push_error(
                class.dec_span,
                format!("Class {} has a loop in its inheritance tree.", name),
            );
            return Err(TypeErrors(std::mem::take(&mut self.errors)));
        }
        let node = match class.superclass.clone() {
            Some(superclass) => {
                stack.insert(name.to_string());
                let parent = self.build_forest_node(&superclass, stack)?;
                stack.remove(name);
                self.forest.add_child(parent, name)
            }
            None => self.forest.add_root(name),
        };
        if let Some(info) = self.classes.get_mut(name) {
            info.node = node;
        }
        Ok(node)
    }

    fn class_decl(&self, name: &str) -> &'a ClassDecl {
        let program = self.program;
        let idx = self.classes[name].class_idx;
        &program.classes[idx]
    }

    /// Validate a function or method signature; `None` means errors were
    /// reported and the function is left out of the tables.
    fn read_signature(&mut self, fun: &Function) -> Option<(Type, Vec<Param>)> {
        let mut ok = true;
        if !self.is_known_type(&fun.return_type, true) {
            ok = false;
            self.push_error(
                fun.dec_span,
                format!(
                    "Function {} has an unknown return type {}.",
                    fun.name, fun.return_type
                ),
            );
        }
        let mut seen = HashSet::new();
        for param in &fun.params {
            if !seen.insert(param.name.clone()) {
                ok = false;
                self.push_error(
                    fun.dec_span,
                    format!(
                        "Function {} has a redeclared argument {}.",
                        fun.name, param.name
                    ),
                );
            }
            if !self.is_known_type(&param.ty, false) {
                ok = false;
                self.push_error(
                    fun.dec_span,
                    format!(
                        "Function {} has an argument of unknown type {}.",
                        fun.name, param.ty
                    ),
                );
            }
        }
        if ok {
            Some((fun.return_type.clone(), fun.params.clone()))
        } else {
            None
        }
    }

    fn gather_functions(&mut self) {
        let program = self.program;
        for (idx, fun) in program.functions.iter().enumerate() {
            if fun.name == MAIN_FUN {
                if fun.return_type != Type::Int {
                    self.push_error(fun.dec_span, "main() function should have int return type.");
                }
                if !fun.params.is_empty() {
                    self.push_error(fun.dec_span, "main() function should take no arguments.");
                }
            }
            if BUILTIN_FUNCTIONS.contains_key(fun.name.as_str()) {
                self.push_error(
                    fun.dec_span,
                    format!("{}() function name conflicts with a builtin one.", fun.name),
                );
            }
            let Some((return_type, params)) = self.read_signature(fun) else {
                continue;
            };
            if self.functions.contains_key(&fun.name) {
                self.push_error(
                    fun.dec_span,
                    format!("Redefinition of function {}.", fun.name),
                );
            } else {
                self.functions.insert(
                    fun.name.clone(),
                    FunctionInfo {
                        fn_idx: idx,
                        return_type,
                        params,
                    },
                );
            }
        }
        if !self.functions.contains_key(MAIN_FUN) {
            self.errors
                .push(TypeError::sentinel("main() function not found."));
        }
    }

    fn gather_class_variables(&mut self) {
        let program = self.program;
        for (idx, class) in program.classes.iter().enumerate() {
            // Only the canonical declaration of a (possibly duplicated)
            // class name contributes members.
            if self.classes.get(&class.name).map(|i| i.class_idx) != Some(idx) {
                continue;
            }
            let mut own: Vec<OwnField> = Vec::new();
            for def in &class.fields {
                let ty_ok = self.is_known_type(&def.ty, false);
                if !ty_ok {
                    self.push_error(
                        def.span,
                        format!(
                            "Class {} contains a variable of unknown type {}.",
                            class.name, def.ty
                        ),
                    );
                }
                for item in &def.items {
                    let mut item_ok = true;
                    if own.iter().any(|f| f.name == item.name) {
                        self.push_error(
                            def.span,
                            format!(
                                "Class {} contains a redeclaration of variable {}.",
                                class.name, item.name
                            ),
                        );
                        item_ok = false;
                    }
                    if let Some(init) = &item.init {
                        self.push_error(
                            init.span,
                            format!(
                                "Class {} contains a definition of variable {}, expected just a declaration.",
                                class.name, item.name
                            ),
                        );
                        item_ok = false;
                    }
                    if ty_ok && item_ok {
                        own.push(OwnField {
                            name: item.name.clone(),
                            ty: def.ty.clone(),
                            span: def.span,
                        });
                    }
                }
            }
            self.own_fields.insert(class.name.clone(), own);
        }
        for root in self.forest.roots().to_vec() {
            self.flatten_fields(root, Vec::new(), HashMap::new());
        }
    }

    fn flatten_fields(
        &mut self,
        node: NodeId,
        inherited: Vec<(Type, String)>,
        inherited_ids: HashMap<String, usize>,
    ) {
        let class = self.forest.node(node).class.clone();
        let mut fields = inherited;
        let mut field_ids = inherited_ids;
        let own = self.own_fields.remove(&class).unwrap_or_default();
        for field in own {
            if field_ids.contains_key(&field.name) {
                self.push_error(
                    field.span,
                    format!(
                        "Class {} redefines an inherited variable {}.",
                        class, field.name
                    ),
                );
                continue;
            }
            field_ids.insert(field.name.clone(), fields.len());
            fields.push((field.ty, field.name));
        }
        if let Some(info) = self.classes.get_mut(&class) {
            info.fields = fields.clone();
            info.field_ids = field_ids.clone();
        }
        for child in self.forest.node(node).children.to_vec() {
            self.flatten_fields(child, fields.clone(), field_ids.clone());
        }
    }

    fn gather_class_methods(&mut self) {
        let program = self.program;
        for (class_idx, class) in program.classes.iter().enumerate() {
            if self.classes.get(&class.name).map(|i| i.class_idx) != Some(class_idx) {
                continue;
            }
            let mut own: Vec<MethodInfo> = Vec::new();
            for (method_idx, method) in class.methods.iter().enumerate() {
                let Some((return_type, params)) = self.read_signature(method) else {
                    continue;
                };
                if own.iter().any(|m| m.name == method.name) {
                    self.push_error(
                        method.dec_span,
                        format!(
                            "Class {}: redefinition of function {}",
                            class.name, method.name
                        ),
                    );
                    continue;
                }
                if self.classes[&class.name]
                    .field_ids
                    .contains_key(&method.name)
                {
                    self.push_error(
                        method.dec_span,
                        format!(
                            "Class {}: function {} shadows a variable.",
                            class.name, method.name
                        ),
                    );
                }
                own.push(MethodInfo {
                    name: method.name.clone(),
                    owner: class.name.clone(),
                    class_idx,
                    method_idx,
                    return_type,
                    params,
                    dec_span: method.dec_span,
                });
            }
            self.own_methods.insert(class.name.clone(), own);
        }
        for root in self.forest.roots().to_vec() {
            self.flatten_methods(root, Vec::new(), HashMap::new());
        }
    }

    fn flatten_methods(
        &mut self,
        node: NodeId,
        inherited: Vec<MethodInfo>,
        inherited_slots: HashMap<String, usize>,
    ) {
        let class = self.forest.node(node).class.clone();
        let mut methods = inherited;
        let mut slots = inherited_slots;
        let own = self.own_methods.remove(&class).unwrap_or_default();
        for method in own {
            let name = method.name.clone();
            match slots.get(&name) {
                Some(&slot) => methods[slot] = method,
                None => {
                    slots.insert(name, methods.len());
                    methods.push(method);
                }
            }
        }
        if let Some(info) = self.classes.get_mut(&class) {
            info.methods = methods.clone();
            info.method_slots = slots.clone();
        }
        for child in self.forest.node(node).children.to_vec() {
            self.flatten_methods(child, methods.clone(), slots.clone());
        }
    }

    fn finish(self) -> Result<TypeInfo, TypeErrors> {
        if self.errors.is_empty() {
            Ok(TypeInfo {
                classes: self.classes,
                functions: self.functions,
                forest: self.forest,
            })
        } else {
            Err(TypeErrors(self.errors))
        }
    }
}

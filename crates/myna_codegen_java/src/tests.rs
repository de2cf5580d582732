use super::*;
use insta::assert_snapshot;
use myna_ast::{
    BinaryOp, Block, ClassDecl, ClosureExpression, ClosureParameter, CompilationUnit, DeclId,
    DeclTable, Declaration, Expression, FieldDecl, FieldInitializer, Literal, MapEntry, Member,
    MethodDecl, MethodNode, ParamDecl, QuoteStyle, ResolvedRef, SemanticType, Span, Statement,
    TemplatePart, TypeDeclaration, TypeKind, UnaryOp, VariableDecl,
};
use std::rc::Rc;

fn dummy_span() -> Span {
    Span::dummy()
}

fn int_type() -> SemanticType {
    SemanticType::int()
}

fn string_type() -> SemanticType {
    SemanticType::string()
}

fn object_type() -> SemanticType {
    SemanticType::object()
}

fn int_literal(text: &str) -> Expression {
    Expression::Literal {
        value: Literal::Number(text.to_string()),
        semantic_type: int_type(),
        span: dummy_span(),
    }
}

fn long_literal(text: &str) -> Expression {
    Expression::Literal {
        value: Literal::Number(text.to_string()),
        semantic_type: SemanticType::Primitive(myna_ast::PrimitiveKind::Long),
        span: dummy_span(),
    }
}

fn string_literal(text: &str) -> Expression {
    Expression::Literal {
        value: Literal::String {
            value: text.to_string(),
            quote: QuoteStyle::Double,
        },
        semantic_type: string_type(),
        span: dummy_span(),
    }
}

fn var_ref(id: DeclId, name: &str, semantic_type: SemanticType) -> Expression {
    Expression::Reference {
        qualifier: None,
        name: name.to_string(),
        resolved: ResolvedRef::variable(id),
        null_safe: false,
        semantic_type,
        span: dummy_span(),
    }
}

fn expression_statement(expr: Expression) -> Statement {
    Statement::Expression {
        expr,
        span: dummy_span(),
    }
}

fn script_unit(decls: DeclTable, statements: Vec<Statement>) -> CompilationUnit {
    let mut unit = CompilationUnit::new(decls);
    unit.script_statements = statements;
    unit.script_class_name = Some("Demo".to_string());
    unit
}

fn prepared(unit: &CompilationUnit) -> JavaCodeGenerator {
    let mut generator = JavaCodeGenerator::new();
    generator.prepare(unit);
    generator
}

/// Declarations for a `Foo` bean with a `width` property and a variable
/// `foo` of that type, shared by the property-rewrite tests.
struct FooFixture {
    decls: DeclTable,
    getter: DeclId,
    setter: DeclId,
    foo_var: DeclId,
}

fn foo_fixture() -> FooFixture {
    let mut decls = DeclTable::new();
    let foo_class = decls.insert(Declaration::Class(ClassDecl::new("Foo")));
    let mut getter = MethodDecl::new("getWidth", vec![], Some(int_type()));
    getter.owner = Some(foo_class);
    let getter = decls.insert(Declaration::Method(getter));
    let mut setter = MethodDecl::new(
        "setWidth",
        vec![ParamDecl::new("value", Some(int_type()))],
        Some(SemanticType::Void),
    );
    setter.owner = Some(foo_class);
    let setter = decls.insert(Declaration::Method(setter));
    let foo_var = decls.insert(Declaration::Variable(VariableDecl::new(
        "foo",
        Some(SemanticType::class("Foo")),
    )));
    FooFixture {
        decls,
        getter,
        setter,
        foo_var,
    }
}

fn width_reference(fixture: &FooFixture) -> Expression {
    Expression::Reference {
        qualifier: Some(Box::new(var_ref(
            fixture.foo_var,
            "foo",
            SemanticType::class("Foo"),
        ))),
        name: "width".to_string(),
        resolved: ResolvedRef::property(fixture.getter),
        null_safe: false,
        semantic_type: int_type(),
        span: dummy_span(),
    }
}

fn width_assignment(fixture: &FooFixture, op: Option<BinaryOp>, value: Expression) -> Expression {
    Expression::Assignment {
        target: Box::new(width_reference(fixture)),
        op,
        op_method: None,
        write_ref: Some(ResolvedRef::property(fixture.setter)),
        value: Box::new(value),
        semantic_type: int_type(),
        span: dummy_span(),
    }
}

#[test]
fn native_numeric_equality_stays_native() {
    let mut decls = DeclTable::new();
    let a = decls.insert(Declaration::Variable(VariableDecl::new("a", Some(int_type()))));
    let b = decls.insert(Declaration::Variable(VariableDecl::new("b", Some(int_type()))));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let expression = Expression::Binary {
        left: Box::new(var_ref(a, "a", int_type())),
        op: BinaryOp::Equal,
        right: Box::new(var_ref(b, "b", int_type())),
        op_method: None,
        semantic_type: SemanticType::boolean(),
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&expression, &mut ctx)
        .expect("binary expression should render");

    assert_eq!(generated, "a == b");
}

#[test]
fn inequality_over_equals_method_is_negated() {
    let mut decls = DeclTable::new();
    let equals = decls.insert(Declaration::Method(MethodDecl::new(
        "equals",
        vec![ParamDecl::new("other", Some(object_type()))],
        Some(SemanticType::boolean()),
    )));
    let a = decls.insert(Declaration::Variable(VariableDecl::new(
        "a",
        Some(SemanticType::class("Foo")),
    )));
    let b = decls.insert(Declaration::Variable(VariableDecl::new(
        "b",
        Some(SemanticType::class("Foo")),
    )));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let expression = Expression::Binary {
        left: Box::new(var_ref(a, "a", SemanticType::class("Foo"))),
        op: BinaryOp::NotEqual,
        right: Box::new(var_ref(b, "b", SemanticType::class("Foo"))),
        op_method: Some(ResolvedRef::method(equals)),
        semantic_type: SemanticType::boolean(),
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&expression, &mut ctx)
        .expect("rewritten inequality should render");

    assert_eq!(generated, "!a.equals(b)");
}

#[test]
fn ordering_over_compare_to_rewrites_against_zero() {
    let mut decls = DeclTable::new();
    let compare_to = decls.insert(Declaration::Method(MethodDecl::new(
        "compareTo",
        vec![ParamDecl::new("other", Some(object_type()))],
        Some(int_type()),
    )));
    let a = decls.insert(Declaration::Variable(VariableDecl::new(
        "a",
        Some(SemanticType::class("Foo")),
    )));
    let b = decls.insert(Declaration::Variable(VariableDecl::new(
        "b",
        Some(SemanticType::class("Foo")),
    )));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let expression = Expression::Binary {
        left: Box::new(var_ref(a, "a", SemanticType::class("Foo"))),
        op: BinaryOp::Greater,
        right: Box::new(var_ref(b, "b", SemanticType::class("Foo"))),
        op_method: Some(ResolvedRef::method(compare_to)),
        semantic_type: SemanticType::boolean(),
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&expression, &mut ctx)
        .expect("ordering rewrite should render");

    assert_eq!(generated, "a.compareTo(b) > 0");
}

#[test]
fn map_literal_desugars_to_sized_construction_and_puts() {
    let map_type = SemanticType::generic(
        "java.util.Map",
        vec![string_type(), SemanticType::Boxed(myna_ast::PrimitiveKind::Int)],
    );
    let mut decls = DeclTable::new();
    let m = decls.insert(Declaration::Variable(VariableDecl::new(
        "m",
        Some(map_type.clone()),
    )));

    let literal = Expression::MapLiteral {
        entries: vec![
            MapEntry {
                key: string_literal("x"),
                value: int_literal("1"),
            },
            MapEntry {
                key: string_literal("y"),
                value: int_literal("2"),
            },
        ],
        semantic_type: map_type,
        span: dummy_span(),
    };
    let statement = Statement::VariableDeclaration {
        decl: m,
        initializer: Some(literal),
        span: dummy_span(),
    };
    let unit = script_unit(decls, vec![statement.clone()]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_statement(&statement, &mut ctx)
        .expect("map literal statement should render");

    assert_eq!(
        generated,
        "final LinkedHashMap<String, Integer> map = new LinkedHashMap<String, Integer>(2);\n\
         map.put(\"x\", 1);\n\
         map.put(\"y\", 2);\n\
         Map<String, Integer> m = map;"
    );
}

#[test]
fn closure_mutating_outer_local_wraps_it_in_a_reference_cell() {
    let mut decls = DeclTable::new();
    let count = decls.insert(Declaration::Variable(VariableDecl::new(
        "count",
        Some(int_type()),
    )));
    let f = decls.insert(Declaration::Variable(VariableDecl::new(
        "f",
        Some(SemanticType::Function {
            params: vec![],
            return_type: Box::new(SemanticType::Void),
        }),
    )));

    let increment = |prefix: bool| Expression::Unary {
        op: UnaryOp::Increment,
        operand: Box::new(var_ref(count, "count", int_type())),
        op_method: None,
        write_ref: None,
        prefix,
        semantic_type: int_type(),
        span: dummy_span(),
    };
    let closure = Expression::Closure(ClosureExpression {
        parameters: vec![],
        body: Block::new(vec![expression_statement(increment(false))]),
        return_type: SemanticType::Void,
        span: dummy_span(),
    });

    let statements = vec![
        Statement::VariableDeclaration {
            decl: count,
            initializer: Some(int_literal("0")),
            span: dummy_span(),
        },
        Statement::VariableDeclaration {
            decl: f,
            initializer: Some(closure),
            span: dummy_span(),
        },
        expression_statement(increment(false)),
    ];
    let unit = script_unit(decls, statements);
    let mut generator = prepared(&unit);
    let mut ctx = generator.root_context();

    let declaration = generator
        .generate_statement(&unit.script_statements[0], &mut ctx)
        .expect("wrapped declaration should render");
    assert_eq!(
        declaration,
        "final AtomicReference<Integer> count$ref = new AtomicReference<Integer>(0);"
    );

    let closure_decl = generator
        .generate_statement(&unit.script_statements[1], &mut ctx)
        .expect("closure declaration should render");
    assert!(closure_decl.contains("new Closure<Void>(this, this) {"));
    assert!(closure_decl.contains("count$ref.set(count$ref.get() + 1);"));

    let outer_increment = generator
        .generate_statement(&unit.script_statements[2], &mut ctx)
        .expect("outer increment should render");
    assert_eq!(outer_increment, "count$ref.set(count$ref.get() + 1);");
}

#[test]
fn variable_never_written_inside_closure_is_not_wrapped() {
    let mut decls = DeclTable::new();
    let count = decls.insert(Declaration::Variable(VariableDecl::new(
        "count",
        Some(int_type()),
    )));
    let closure = Expression::Closure(ClosureExpression {
        parameters: vec![],
        body: Block::new(vec![expression_statement(var_ref(
            count,
            "count",
            int_type(),
        ))]),
        return_type: int_type(),
        span: dummy_span(),
    });
    let unit = script_unit(
        decls,
        vec![
            Statement::VariableDeclaration {
                decl: count,
                initializer: Some(int_literal("0")),
                span: dummy_span(),
            },
            expression_statement(closure),
        ],
    );

    let analysis = LocalVarAnalyzer::analyze(&unit);
    assert!(!analysis.is_wrapped(count));
}

#[test]
fn null_safe_navigation_hoists_the_qualifier() {
    let mut decls = DeclTable::new();
    let foo_class = decls.insert(Declaration::Class(ClassDecl::new("Foo")));
    let mut field = FieldDecl {
        name: "b".to_string(),
        owner: Some(foo_class),
        declared_type: Some(int_type()),
        modifiers: Default::default(),
    };
    field.modifiers.is_static = false;
    let b = decls.insert(Declaration::Field(field));
    let a = decls.insert(Declaration::Variable(VariableDecl::new(
        "a",
        Some(SemanticType::class("Foo")),
    )));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let expression = Expression::Reference {
        qualifier: Some(Box::new(var_ref(a, "a", SemanticType::class("Foo")))),
        name: "b".to_string(),
        resolved: ResolvedRef::field(b),
        null_safe: true,
        semantic_type: SemanticType::Boxed(myna_ast::PrimitiveKind::Int),
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&expression, &mut ctx)
        .expect("null-safe navigation should render");

    assert_eq!(generated, "(tmp == null ? null : tmp.b)");
    assert_eq!(ctx.take_helpers(), vec!["final Foo tmp = a;".to_string()]);
}

#[test]
fn elvis_hoists_subject_and_tests_truthiness() {
    let mut decls = DeclTable::new();
    let s = decls.insert(Declaration::Variable(VariableDecl::new(
        "s",
        Some(string_type()),
    )));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let expression = Expression::Ternary {
        condition: Box::new(var_ref(s, "s", string_type())),
        then_expr: None,
        else_expr: Box::new(string_literal("d")),
        semantic_type: string_type(),
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&expression, &mut ctx)
        .expect("elvis should render");

    assert_eq!(generated, "(tmp != null && tmp.asBoolean() ? tmp : \"d\")");
    assert_eq!(ctx.take_helpers(), vec!["final String tmp = s;".to_string()]);
}

#[test]
fn if_condition_applies_truthiness_rewrite() {
    let mut decls = DeclTable::new();
    let s = decls.insert(Declaration::Variable(VariableDecl::new(
        "s",
        Some(string_type()),
    )));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let statement = Statement::If {
        condition: var_ref(s, "s", string_type()),
        then_stmt: Box::new(Statement::Return {
            value: None,
            span: dummy_span(),
        }),
        else_stmt: None,
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_statement(&statement, &mut ctx)
        .expect("if statement should render");

    assert_eq!(
        generated,
        "if (s != null && s.asBoolean()) {\n    return;\n}\n"
    );
}

#[test]
fn property_assignment_in_statement_position_calls_the_setter() {
    let fixture = foo_fixture();
    let assignment = width_assignment(&fixture, None, int_literal("5"));
    let unit = script_unit(fixture.decls.clone(), vec![]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_statement(&expression_statement(assignment), &mut ctx)
        .expect("property assignment should render");

    assert_eq!(generated, "foo.setWidth(5);");
}

#[test]
fn value_position_property_assignment_with_simple_value_is_hoisted() {
    let fixture = foo_fixture();
    let mut decls = fixture.decls.clone();
    let w = decls.insert(Declaration::Variable(VariableDecl::new("w", Some(int_type()))));
    let assignment = width_assignment(&fixture, None, int_literal("5"));
    let statement = Statement::VariableDeclaration {
        decl: w,
        initializer: Some(assignment),
        span: dummy_span(),
    };
    let unit = script_unit(decls, vec![statement.clone()]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_statement(&statement, &mut ctx)
        .expect("hoisted assignment should render");

    assert_eq!(generated, "foo.setWidth(5);\nint w = 5;");
}

#[test]
fn value_position_property_assignment_routes_through_setter_helper() {
    let fixture = foo_fixture();
    let value = Expression::Binary {
        left: Box::new(int_literal("1")),
        op: BinaryOp::Add,
        right: Box::new(int_literal("2")),
        op_method: None,
        semantic_type: int_type(),
        span: dummy_span(),
    };
    let assignment = width_assignment(&fixture, None, value);
    let unit = script_unit(fixture.decls.clone(), vec![]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&assignment, &mut ctx)
        .expect("helper-backed assignment should render");

    assert_eq!(generated, "$setWidth(foo, 1 + 2)");
}

#[test]
fn setter_helper_is_emitted_once_into_the_script_class() {
    let fixture = foo_fixture();
    let value = Expression::Binary {
        left: Box::new(int_literal("1")),
        op: BinaryOp::Add,
        right: Box::new(int_literal("2")),
        op_method: None,
        semantic_type: int_type(),
        span: dummy_span(),
    };
    let mut decls = fixture.decls.clone();
    let w = decls.insert(Declaration::Variable(VariableDecl::new("w", Some(int_type()))));
    let statement = Statement::VariableDeclaration {
        decl: w,
        initializer: Some(width_assignment(&fixture, None, value)),
        span: dummy_span(),
    };
    let unit = script_unit(decls, vec![statement]);
    let mut generator = JavaCodeGenerator::new();
    let generated = generator
        .generate_compilation_unit(&unit)
        .expect("script unit should convert");

    let script = &generated.type_declarations[0];
    assert!(script.contains("int w = $setWidth(foo, 1 + 2);"));
    assert!(script.contains("private static int $setWidth(Foo owner, int value) {"));
    assert!(script.contains("owner.setWidth(value);"));
    assert_eq!(script.matches("private static int $setWidth").count(), 1);
}

#[test]
fn compound_property_assignment_reads_through_the_getter() {
    let fixture = foo_fixture();
    let assignment = width_assignment(&fixture, Some(BinaryOp::Add), int_literal("2"));
    let unit = script_unit(fixture.decls.clone(), vec![]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_statement(&expression_statement(assignment), &mut ctx)
        .expect("compound property assignment should render");

    assert_eq!(generated, "foo.setWidth(foo.getWidth() + 2);");
}

#[test]
fn property_increment_expands_to_read_operate_write() {
    let fixture = foo_fixture();
    let increment = Expression::Unary {
        op: UnaryOp::Increment,
        operand: Box::new(width_reference(&fixture)),
        op_method: None,
        write_ref: Some(ResolvedRef::property(fixture.setter)),
        prefix: false,
        semantic_type: int_type(),
        span: dummy_span(),
    };
    let unit = script_unit(fixture.decls.clone(), vec![]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_statement(&expression_statement(increment), &mut ctx)
        .expect("property increment should render");

    assert_eq!(generated, "foo.setWidth(foo.getWidth() + 1);");
}

#[test]
fn setter_names_are_stable_and_distinct() {
    let shared = Rc::new(SharedState::default());
    let ctx = ExpressionContext::new(shared);

    let first = ctx.setter_name(DeclId(7), "width");
    let again = ctx.setter_name(DeclId(7), "width");
    let other = ctx.setter_name(DeclId(8), "width");

    assert_eq!(first, "$setWidth");
    assert_eq!(again, first);
    assert_eq!(other, "$setWidth1");
}

#[test]
fn copied_contexts_do_not_share_fresh_name_allocations() {
    let shared = Rc::new(SharedState::default());
    let ctx = ExpressionContext::new(shared);

    let mut left = ctx.copy();
    let mut right = ctx.copy();

    assert_eq!(left.fresh_name("tmp"), "tmp");
    assert_eq!(right.fresh_name("tmp"), "tmp");
    assert_eq!(left.fresh_name("tmp"), "tmp1");
}

#[test]
fn fresh_names_skip_java_keywords() {
    let shared = Rc::new(SharedState::default());
    let mut ctx = ExpressionContext::new(shared);
    assert_eq!(ctx.fresh_name("new"), "new1");
}

#[test]
fn type_rendering_is_idempotent() {
    let unit = script_unit(DeclTable::new(), vec![]);
    let mut generator = prepared(&unit);
    let list_of_int = SemanticType::generic("java.util.List", vec![int_type()]);

    let first = generator.write_type(&list_of_int).expect("type should render");
    let second = generator.write_type(&list_of_int).expect("type should render");

    assert_eq!(first, "List<Integer>");
    assert_eq!(first, second);
}

#[test]
fn wildcard_bounds_render_extends_and_super() {
    let unit = script_unit(DeclTable::new(), vec![]);
    let mut generator = prepared(&unit);

    let extends = SemanticType::Wildcard {
        kind: myna_ast::WildcardKind::Extends,
        bound: Some(Box::new(SemanticType::class("java.lang.Number"))),
    };
    assert_eq!(
        generator.write_type(&extends).expect("wildcard should render"),
        "? extends Number"
    );

    let unbounded = SemanticType::Wildcard {
        kind: myna_ast::WildcardKind::Unbounded,
        bound: None,
    };
    assert_eq!(
        generator.write_type(&unbounded).expect("wildcard should render"),
        "?"
    );
}

#[test]
fn varargs_parameter_renders_ellipsis_only_when_requested() {
    let unit = script_unit(DeclTable::new(), vec![]);
    let mut generator = prepared(&unit);
    let ints = SemanticType::array(int_type());

    assert_eq!(
        generator
            .write_parameter_type(&ints, true)
            .expect("ellipsis parameter should render"),
        "int..."
    );
    assert_eq!(
        generator
            .write_parameter_type(&ints, false)
            .expect("array parameter should render"),
        "int[]"
    );
}

#[test]
fn untyped_parameter_type_is_joined_from_call_sites() {
    let mut decls = DeclTable::new();
    let plot = decls.insert(Declaration::Method(MethodDecl::new(
        "plot",
        vec![ParamDecl::new("value", None)],
        Some(SemanticType::Void),
    )));
    let call = |arg: Expression| {
        expression_statement(Expression::Call {
            receiver: None,
            name: "plot".to_string(),
            resolved: ResolvedRef::method(plot),
            args: vec![arg],
            null_safe: false,
            semantic_type: SemanticType::Void,
            span: dummy_span(),
        })
    };
    let unit = script_unit(decls, vec![call(int_literal("1")), call(long_literal("2L"))]);

    let provider = TypeProvider::new(&unit, Rc::new(unit.decls.clone()));
    let inferred = provider.parameter_type(plot, 0);
    assert_eq!(
        inferred,
        SemanticType::Primitive(myna_ast::PrimitiveKind::Long)
    );
    assert_eq!(provider.parameter_type(plot, 0), inferred);
}

#[test]
fn varargs_call_wraps_trailing_arguments() {
    let mut decls = DeclTable::new();
    let mut printf = MethodDecl::new(
        "printf",
        vec![
            ParamDecl::new("format", Some(string_type())),
            ParamDecl::new("args", Some(SemanticType::array(object_type()))),
        ],
        Some(SemanticType::Void),
    );
    printf.is_varargs = true;
    let printf = decls.insert(Declaration::Method(printf));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let call = Expression::Call {
        receiver: None,
        name: "printf".to_string(),
        resolved: ResolvedRef::method(printf),
        args: vec![string_literal("x"), int_literal("1"), int_literal("2")],
        null_safe: false,
        semantic_type: SemanticType::Void,
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&call, &mut ctx)
        .expect("varargs call should render");

    assert_eq!(generated, "printf(\"x\", new Object[]{1, 2})");
}

fn greeter_fixture() -> (DeclTable, DeclId) {
    let mut decls = DeclTable::new();
    // Ids are handed out sequentially, so the class can name its method's
    // id before the method is inserted.
    let mut greeter = ClassDecl::new("Greeter");
    greeter.kind = TypeKind::Interface;
    greeter.methods = vec![DeclId(1)];
    let greeter_id = decls.insert(Declaration::Class(greeter));
    let mut greet = MethodDecl::new(
        "greet",
        vec![ParamDecl::new("name", Some(string_type()))],
        Some(string_type()),
    );
    greet.owner = Some(greeter_id);
    let greet_id = decls.insert(Declaration::Method(greet));
    assert_eq!(greet_id, DeclId(1));
    (decls, greeter_id)
}

#[test]
fn anonymous_from_map_reuses_matching_signature() {
    let (mut decls, greeter_id) = greeter_fixture();
    let param = decls.insert(Declaration::Parameter(ParamDecl::new(
        "name",
        Some(string_type()),
    )));

    let closure = ClosureExpression {
        parameters: vec![ClosureParameter {
            decl: param,
            default_value: None,
        }],
        body: Block::new(vec![expression_statement(string_literal("hi"))]),
        return_type: string_type(),
        span: dummy_span(),
    };
    let cast = Expression::Cast {
        operand: Box::new(Expression::MapLiteral {
            entries: vec![MapEntry {
                key: string_literal("greet"),
                value: Expression::Closure(closure),
            }],
            semantic_type: object_type(),
            span: dummy_span(),
        }),
        target: SemanticType::class("Greeter"),
        target_class: Some(greeter_id),
        safe: true,
        conversion: None,
        span: dummy_span(),
    };
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&cast, &mut ctx)
        .expect("anonymous class should render");

    assert_eq!(
        generated,
        "new Greeter() {\n    public String greet(String name) {\n        return \"hi\";\n    }\n}"
    );
}

#[test]
fn anonymous_from_map_falls_back_to_public_for_unmatched_arity() {
    // Documented contract: an entry with no matching signature on the
    // target type keeps public visibility and the closure's own inferred
    // return type instead of failing.
    let (mut decls, greeter_id) = greeter_fixture();
    let param = decls.insert(Declaration::Parameter(ParamDecl::new("p", None)));

    let closure = ClosureExpression {
        parameters: vec![ClosureParameter {
            decl: param,
            default_value: None,
        }],
        body: Block::new(vec![expression_statement(int_literal("1"))]),
        return_type: int_type(),
        span: dummy_span(),
    };
    let cast = Expression::Cast {
        operand: Box::new(Expression::MapLiteral {
            entries: vec![MapEntry {
                key: string_literal("shout"),
                value: Expression::Closure(closure),
            }],
            semantic_type: object_type(),
            span: dummy_span(),
        }),
        target: SemanticType::class("Greeter"),
        target_class: Some(greeter_id),
        safe: true,
        conversion: None,
        span: dummy_span(),
    };
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&cast, &mut ctx)
        .expect("fallback signature should render");

    assert!(generated.contains("public Integer shout(Object p) {"));
    assert!(generated.contains("return 1;"));
}

#[test]
fn closure_default_parameters_emit_truncated_overloads() {
    let mut decls = DeclTable::new();
    let a = decls.insert(Declaration::Parameter(ParamDecl::new("a", Some(int_type()))));
    let b = decls.insert(Declaration::Parameter(ParamDecl::new("b", Some(int_type()))));

    let body = Expression::Binary {
        left: Box::new(Expression::Reference {
            qualifier: None,
            name: "a".to_string(),
            resolved: ResolvedRef::variable(a),
            null_safe: false,
            semantic_type: int_type(),
            span: dummy_span(),
        }),
        op: BinaryOp::Add,
        right: Box::new(Expression::Reference {
            qualifier: None,
            name: "b".to_string(),
            resolved: ResolvedRef::variable(b),
            null_safe: false,
            semantic_type: int_type(),
            span: dummy_span(),
        }),
        op_method: None,
        semantic_type: int_type(),
        span: dummy_span(),
    };
    let closure = Expression::Closure(ClosureExpression {
        parameters: vec![
            ClosureParameter {
                decl: a,
                default_value: None,
            },
            ClosureParameter {
                decl: b,
                default_value: Some(int_literal("10")),
            },
        ],
        body: Block::new(vec![expression_statement(body)]),
        return_type: int_type(),
        span: dummy_span(),
    });
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&closure, &mut ctx)
        .expect("closure with defaults should render");

    assert_eq!(
        generated,
        "new Closure<Integer>(this, this) {\n\
         \x20   public Integer call(int a, int b) {\n\
         \x20       return a + b;\n\
         \x20   }\n\
         \n\
         \x20   public Integer call(int a) {\n\
         \x20       return call(a, 10);\n\
         \x20   }\n\
         }"
    );
}

#[test]
fn named_argument_construction_splits_into_write_statements() {
    let mut decls = DeclTable::new();
    let point = decls.insert(Declaration::Class(ClassDecl::new("Point")));
    let mut set_x = MethodDecl::new(
        "setX",
        vec![ParamDecl::new("value", Some(int_type()))],
        Some(SemanticType::Void),
    );
    set_x.owner = Some(point);
    let set_x = decls.insert(Declaration::Method(set_x));
    let y = decls.insert(Declaration::Field(FieldDecl {
        name: "y".to_string(),
        owner: Some(point),
        declared_type: Some(int_type()),
        modifiers: Default::default(),
    }));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let construction = Expression::New {
        class_type: SemanticType::class("Point"),
        constructor: None,
        args: vec![],
        initializers: vec![
            FieldInitializer {
                name: "x".to_string(),
                write_ref: Some(ResolvedRef::property(set_x)),
                value: int_literal("1"),
            },
            FieldInitializer {
                name: "y".to_string(),
                write_ref: Some(ResolvedRef::field(y)),
                value: int_literal("2"),
            },
        ],
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&construction, &mut ctx)
        .expect("named-argument construction should render");

    assert_eq!(generated, "point");
    assert_eq!(
        ctx.take_helpers(),
        vec![
            "final Point point = new Point();".to_string(),
            "point.setX(1);".to_string(),
            "point.y = 2;".to_string(),
        ]
    );
}

#[test]
fn unresolved_bare_reference_routes_through_binding_protocol() {
    let mut decls = DeclTable::new();
    let t = decls.insert(Declaration::Variable(VariableDecl::new("t", None)));
    let statement = Statement::VariableDeclaration {
        decl: t,
        initializer: Some(Expression::Reference {
            qualifier: None,
            name: "title".to_string(),
            resolved: ResolvedRef::unresolved(),
            null_safe: false,
            semantic_type: object_type(),
            span: dummy_span(),
        }),
        span: dummy_span(),
    };
    let unit = script_unit(decls, vec![statement]);

    let mut generator = JavaCodeGenerator::new();
    let generated = generator
        .generate_compilation_unit(&unit)
        .expect("script should convert");

    assert!(generated.type_declarations[0].contains("Object t = getProperty(\"title\");"));
    assert_eq!(generated.caveats.len(), 1);
    assert!(generated.caveats[0].message.contains("title"));
}

#[test]
fn string_template_renders_string_format() {
    let mut decls = DeclTable::new();
    let name = decls.insert(Declaration::Variable(VariableDecl::new(
        "name",
        Some(string_type()),
    )));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let template = Expression::StringTemplate {
        parts: vec![
            TemplatePart::Text("Hello, ".to_string()),
            TemplatePart::Interpolation(var_ref(name, "name", string_type())),
            TemplatePart::Text("!".to_string()),
        ],
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    let generated = generator
        .generate_expression(&template, &mut ctx)
        .expect("template should render");

    assert_eq!(generated, "String.format(\"Hello, %s!\", name)");
}

#[test]
fn quoting_variants_share_one_canonical_literal_form() {
    let unit = script_unit(DeclTable::new(), vec![]);
    let mut generator = prepared(&unit);

    let single = Expression::Literal {
        value: Literal::String {
            value: "ok".to_string(),
            quote: QuoteStyle::Single,
        },
        semantic_type: string_type(),
        span: dummy_span(),
    };
    let triple = Expression::Literal {
        value: Literal::String {
            value: "ok".to_string(),
            quote: QuoteStyle::Triple,
        },
        semantic_type: string_type(),
        span: dummy_span(),
    };

    let mut ctx = generator.root_context();
    let first = generator.generate_expression(&single, &mut ctx).unwrap();
    let second = generator.generate_expression(&triple, &mut ctx).unwrap();
    assert_eq!(first, "\"ok\"");
    assert_eq!(first, second);
}

#[test]
fn index_access_desugars_through_resolved_candidates() {
    let mut decls = DeclTable::new();
    let get_at = decls.insert(Declaration::Method(MethodDecl::new(
        "getAt",
        vec![ParamDecl::new("index", Some(int_type()))],
        Some(object_type()),
    )));
    let put_at = decls.insert(Declaration::Method(MethodDecl::new(
        "putAt",
        vec![
            ParamDecl::new("index", Some(int_type())),
            ParamDecl::new("value", Some(object_type())),
        ],
        Some(SemanticType::Void),
    )));
    let xs = decls.insert(Declaration::Variable(VariableDecl::new(
        "xs",
        Some(SemanticType::generic("java.util.List", vec![object_type()])),
    )));
    let unit = script_unit(decls, vec![]);
    let mut generator = prepared(&unit);

    let read = Expression::Index {
        collection: Box::new(var_ref(xs, "xs", object_type())),
        index: Box::new(int_literal("0")),
        resolved: Some(ResolvedRef::method(get_at)),
        semantic_type: object_type(),
        span: dummy_span(),
    };
    let mut ctx = generator.root_context();
    assert_eq!(
        generator.generate_expression(&read, &mut ctx).unwrap(),
        "xs.getAt(0)"
    );

    let write = Expression::Assignment {
        target: Box::new(read.clone()),
        op: None,
        op_method: None,
        write_ref: Some(ResolvedRef::method(put_at)),
        value: Box::new(int_literal("5")),
        semantic_type: object_type(),
        span: dummy_span(),
    };
    let generated = generator
        .generate_statement(&expression_statement(write), &mut ctx)
        .unwrap();
    assert_eq!(generated, "xs.putAt(0, 5);");
}

#[test]
fn class_conversion_produces_source_edit_for_type_span() {
    let mut decls = DeclTable::new();
    let foo = decls.insert(Declaration::Class(ClassDecl::new("Foo")));
    let x = decls.insert(Declaration::Field(FieldDecl {
        name: "x".to_string(),
        owner: Some(foo),
        declared_type: Some(int_type()),
        modifiers: Default::default(),
    }));
    let mut unit = CompilationUnit::new(decls);
    let span = Span::new(3, 1, 10, 2);
    unit.types.push(TypeDeclaration {
        decl: foo,
        members: vec![Member::Field {
            decl: x,
            initializer: Some(int_literal("1")),
            span: dummy_span(),
        }],
        span: span.clone(),
    });

    let mut generator = JavaCodeGenerator::new();
    let edits = generator
        .generate_type_edits(&unit)
        .expect("edits should generate");

    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].span, span);
    assert!(edits[0].replacement.starts_with("public class Foo {"));
    assert!(edits[0].replacement.contains("public int x = 1;"));
}

#[test]
fn script_unit_wraps_statements_in_runnable_class() {
    let mut decls = DeclTable::new();
    let greeting = decls.insert(Declaration::Variable(VariableDecl::new(
        "greeting",
        Some(string_type()),
    )));
    let banner = decls.insert(Declaration::Method(MethodDecl::new(
        "banner",
        vec![ParamDecl::new("message", Some(string_type()))],
        Some(SemanticType::Void),
    )));

    let mut unit = script_unit(
        decls,
        vec![
            Statement::VariableDeclaration {
                decl: greeting,
                initializer: Some(string_literal("hi")),
                span: dummy_span(),
            },
            expression_statement(Expression::Call {
                receiver: None,
                name: "banner".to_string(),
                resolved: ResolvedRef::method(banner),
                args: vec![var_ref(greeting, "greeting", string_type())],
                null_safe: false,
                semantic_type: SemanticType::Void,
                span: dummy_span(),
            }),
        ],
    );
    unit.script_methods.push(MethodNode {
        decl: banner,
        body: Some(Block::new(vec![Statement::Return {
            value: None,
            span: dummy_span(),
        }])),
        span: dummy_span(),
    });

    let mut generator = JavaCodeGenerator::new();
    let generated = generator
        .generate_compilation_unit(&unit)
        .expect("script should convert");
    let source = generated.to_source(generator.config());

    assert_snapshot!(source, @r###"
    import myna.runtime.Script;

    public class Demo extends Script {

        public static void main(String[] args) {
            new Demo().run();
        }

        public Object run() {
            String greeting = "hi";
            banner(greeting);
            return null;
        }

        public void banner(String message) {
            return;
        }
    }
    "###);
}

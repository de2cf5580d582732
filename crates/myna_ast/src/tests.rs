use super::*;

fn dummy_span() -> Span {
    Span::dummy()
}

fn int_literal(text: &str) -> Expression {
    Expression::Literal {
        value: Literal::Number(text.to_string()),
        semantic_type: SemanticType::int(),
        span: dummy_span(),
    }
}

#[test]
fn expression_tree_round_trips_through_serde() {
    let expression = Expression::Binary {
        left: Box::new(int_literal("1")),
        op: BinaryOp::Add,
        right: Box::new(int_literal("2")),
        op_method: None,
        semantic_type: SemanticType::int(),
        span: dummy_span(),
    };

    let json = serde_json::to_string(&expression).expect("expression should serialize");
    let decoded: Expression = serde_json::from_str(&json).expect("expression should deserialize");

    assert_eq!(decoded, expression);
}

#[test]
fn decl_table_hands_out_sequential_ids() {
    let mut table = DeclTable::new();
    let first = table.insert(Declaration::Variable(VariableDecl::new("a", None)));
    let second = table.insert(Declaration::Variable(VariableDecl::new("b", None)));

    assert_eq!(first, DeclId(0));
    assert_eq!(second, DeclId(1));
    assert_eq!(table.name_of(second), Some("b"));
}

#[test]
fn substitution_replaces_type_parameters_recursively() {
    let mut substitution = std::collections::BTreeMap::new();
    substitution.insert("T".to_string(), SemanticType::string());

    let list_of_t = SemanticType::generic("java.util.List", vec![SemanticType::class("T")]);
    let substituted = list_of_t.substitute(&substitution);

    assert_eq!(
        substituted,
        SemanticType::generic("java.util.List", vec![SemanticType::string()])
    );
}

#[test]
fn property_name_strips_accessor_prefix() {
    let getter = MethodDecl::new("getWidth", vec![], Some(SemanticType::int()));
    assert_eq!(getter.property_name(), Some("width".to_string()));

    let setter = MethodDecl::new(
        "setWidth",
        vec![ParamDecl::new("value", Some(SemanticType::int()))],
        None,
    );
    assert_eq!(setter.property_name(), Some("width".to_string()));

    let plain = MethodDecl::new("width", vec![], None);
    assert_eq!(plain.property_name(), None);
}

#[test]
fn walk_visits_closure_bodies() {
    let mut table = DeclTable::new();
    let param = table.insert(Declaration::Parameter(ParamDecl::new("it", None)));

    let closure = Expression::Closure(ClosureExpression {
        parameters: vec![ClosureParameter {
            decl: param,
            default_value: None,
        }],
        body: Block::new(vec![Statement::Expression {
            expr: int_literal("42"),
            span: dummy_span(),
        }]),
        return_type: SemanticType::int(),
        span: dummy_span(),
    });

    let mut seen_literal = false;
    closure.walk(&mut |expr| {
        if matches!(expr, Expression::Literal { .. }) {
            seen_literal = true;
        }
    });
    assert!(seen_literal, "walk must descend into closure bodies");
}

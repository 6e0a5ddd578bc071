use dynaquery::{
    BooleanOp, CompilerConfig, Condition, ConditionOp, ParameterSet, QueryExample, Value, memory,
    select,
};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct PersonFilter {
    name: Option<String>,
    age: u32,
    active: bool,
    city: Option<String>,
}

#[test]
fn test_example_drives_select() {
    let example = QueryExample::from_serialize(&PersonFilter {
        name: Some("Ann".into()),
        age: 0,
        active: false,
        city: None,
    })
    .unwrap();

    let query = select("Person", "p")
        .where_params(example.build())
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p where p.name like :name");
    assert_eq!(query.param("name"), Some(&Value::Text("%Ann%".into())));
}

#[test]
fn test_example_with_nested_object() {
    let example = json!({ "address": { "city": "Cali", "zip": "" }, "kind": "vip" });
    let params = QueryExample::new(&example)
        .build()
        .auto_wildcard_strings(false);

    let query = select("Person", "p").where_params(params).build().unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.address.city = :addresscity and p.kind = :kind"
    );
}

#[test]
fn test_same_parameters_compile_and_filter_consistently() {
    let people = vec![
        json!({ "name": "Ann", "age": 31, "city": "Bogota" }),
        json!({ "name": "Bob", "age": 17, "city": "Medellin" }),
        json!({ "name": "Carl", "age": 52, "city": "Cali" }),
    ];

    let cities = ParameterSet::new().with(
        "city",
        Condition::from_operands(ConditionOp::In, vec![Value::from(vec!["Bogota", "Cali"])])
            .unwrap(),
    );
    let params = ParameterSet::new()
        .with("age", Condition::gte(18))
        .with_group(cities, BooleanOp::And);

    let found: Vec<_> = memory::filter(&people, &params)
        .into_iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(found, vec!["Ann", "Carl"]);

    let query = select("Person", "p").where_params(params).build().unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.age >= :age and (p.city in (:city))"
    );
}

#[test]
fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("dynaquery-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        "default_alias = \"x\"\nappend_alias = true\nauto_wildcard_strings = false\n",
    )
    .unwrap();
    let config = CompilerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.default_alias, "x");
    let mut qb = dynaquery::select_fields(["name"])
        .from("Person", "")
        .with_config(&config);
    qb.parameters().borrow_mut().insert("name", "Ann");
    assert_eq!(
        qb.to_query_string().unwrap(),
        "select x.name from Person x where x.name = :name"
    );
}

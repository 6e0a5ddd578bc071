//! Integration tests for the qb module.

use crate::condition::{BooleanOp, Condition, ConditionGroup};
use crate::config::CompilerConfig;
use crate::error::QueryError;
use crate::params::{Paginator, ParameterSet};
use crate::qb::{
    Entity, QueryMode, ResultType, delete, from_parameters, select, select_as, select_entity,
    select_fields, update,
};
use crate::value::Value;

#[test]
fn test_select_equals() {
    let query = select("Person", "p")
        .where_cond("name", Condition::eq("Ann"))
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p where p.name = :name");
    assert_eq!(query.param("name"), Some(&Value::Text("Ann".into())));
    assert_eq!(query.bindings.len(), 1);
}

#[test]
fn test_select_auto_wildcard_parameters() {
    let query = select("Person", "p")
        .where_params(ParameterSet::new().with("name", "Ann%"))
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p where p.name like :name");
    assert_eq!(query.param("name"), Some(&Value::Text("%Ann%%".into())));
}

#[test]
fn test_plain_text_without_wildcard_is_equality() {
    let query = select("Person", "p")
        .where_params(
            ParameterSet::new()
                .with("name", "Ann")
                .auto_wildcard_strings(false),
        )
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p where p.name = :name");
    assert_eq!(query.param("name"), Some(&Value::Text("Ann".into())));
}

#[test]
fn test_update_binds_new_value() {
    let query = update("Person", "p")
        .set([("age", 30)])
        .where_cond("id", Condition::eq(7))
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "update  Person p set p.age=:newValueage where p.id = :id"
    );
    assert_eq!(query.param("newValueage"), Some(&Value::Int(30)));
    assert_eq!(query.param("id"), Some(&Value::Int(7)));
    assert_eq!(query.mode, QueryMode::Update);
}

#[test]
fn test_update_inlines_text_expressions() {
    let query = update("Parameter", "p")
        .set([
            ("label", Value::from("'El Param'")),
            ("p.id", Value::from("p.id+1")),
            ("value", Value::from(1000)),
        ])
        .where_raw("p.id > 1000")
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "update  Parameter p set p.label='El Param', p.id=p.id+1, p.value=:newValuevalue where p.id > 1000"
    );
    assert_eq!(query.bindings.len(), 1);
}

#[test]
fn test_update_key_collision_is_disambiguated() {
    let query = update("Person", "p")
        .set([("a.b", 1), ("ab", 2)])
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "update  Person p set p.a.b=:newValueab, p.ab=:newValueab2"
    );
    assert_eq!(query.param("newValueab"), Some(&Value::Int(1)));
    assert_eq!(query.param("newValueab2"), Some(&Value::Int(2)));
}

#[test]
fn test_update_qualifies_target_of_self_referencing_expression() {
    let query = update("Person", "p")
        .set([("counter", "p.counter+1")])
        .where_cond("id", Condition::eq(3))
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "update  Person p set p.counter=p.counter+1 where p.id = :id"
    );
}

#[test]
fn test_set_after_build_is_rendered() {
    let mut qb = update("Person", "p").set([("age", 30)]);
    let first = qb.build().unwrap();
    assert_eq!(first.sql, "update  Person p set p.age=:newValueage");

    let mut qb = qb.set([("name", 5), ("age", 31)]);
    let second = qb.build().unwrap();
    assert_eq!(
        second.sql,
        "update  Person p set p.age=:newValueage, p.name=:newValuename"
    );
    assert_eq!(second.param("newValueage"), Some(&Value::Int(31)));
    assert_eq!(second.param("newValuename"), Some(&Value::Int(5)));
    assert_eq!(second.bindings.len(), 2);

    assert_eq!(qb.build().unwrap(), second);
}

#[test]
fn test_update_without_fields_fails() {
    let err = update("Person", "p")
        .where_cond("id", Condition::eq(1))
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::MissingUpdateFields));
}

#[test]
fn test_set_on_select_fails() {
    let err = select("Person", "p").set([("age", 1)]).build().unwrap_err();
    assert!(matches!(
        err,
        QueryError::WrongMode {
            expected: QueryMode::Update,
            actual: QueryMode::Select
        }
    ));
}

#[test]
fn test_delete() {
    let query = delete("Person", "p")
        .where_cond("active", Condition::eq(false))
        .build()
        .unwrap();
    assert_eq!(query.sql, "delete from  Person p where p.active = :active");
    assert_eq!(query.param("active"), Some(&Value::Bool(false)));
}

#[test]
fn test_nested_group_distinct_placeholders() {
    let cities = ParameterSet::new().with(
        "city",
        ConditionGroup::new()
            .and(Condition::eq("Bogota"))
            .or(Condition::eq("Medellin")),
    );
    let params = ParameterSet::new()
        .with("name", Condition::eq("Ann"))
        .with_group(cities, BooleanOp::And);

    let query = select("Person", "p").where_params(params).build().unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.name = :name and (p.city = :city or p.city = :city2)"
    );
    assert_eq!(query.param("city"), Some(&Value::Text("Bogota".into())));
    assert_eq!(query.param("city2"), Some(&Value::Text("Medellin".into())));
    assert!(query.is_fully_bound());
}

#[test]
fn test_empty_parameters_emit_no_where() {
    let query = select("Person", "p")
        .where_params(ParameterSet::new())
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p");
    assert!(!query.sql.contains("where"));
}

#[test]
fn test_empty_sub_group_is_skipped() {
    let params = ParameterSet::new()
        .with("age", Condition::gt(18))
        .with_group(ParameterSet::new(), BooleanOp::Or);
    let query = select("Person", "p").where_params(params).build().unwrap();
    assert_eq!(query.sql, "select p from Person p where p.age > :age");
}

#[test]
fn test_group_entry_members_and_or_rendering() {
    let params = ParameterSet::new()
        .with("name", "Ann")
        .with(
            "value",
            ConditionGroup::new()
                .and(Condition::eq(1))
                .or(Condition::in_list(vec![1, 2, 3])),
        )
        .order_by("name", false);
    let query = select("Parameter", "p").where_params(params).build().unwrap();
    assert_eq!(
        query.sql,
        "select p from Parameter p where p.name like :name and p.value = :value or p.value in (:value2) order by p.name DESC"
    );
    assert_eq!(query.param("value2"), Some(&Value::from(vec![1, 2, 3])));
}

#[test]
fn test_sub_group_with_or_members() {
    let inner = ParameterSet::new()
        .with("value", Condition::eq(1))
        .with("id", Condition::in_list(vec![1, 2]).or());
    let params = ParameterSet::new()
        .with("name", "Ann")
        .with_group(inner, BooleanOp::And)
        .order_by("name", false);
    let query = select("Parameter", "p").where_params(params).build().unwrap();
    assert_eq!(
        query.sql,
        "select p from Parameter p where p.name like :name and (p.value = :value or p.id in (:id)) order by p.name DESC"
    );
}

#[test]
fn test_sort_with_explicit_direction() {
    let params = ParameterSet::new().order_by("name desc", true);
    let query = select("Person", "p").where_params(params).build().unwrap();
    assert_eq!(query.sql, "select p from Person p order by p.name desc");
}

#[test]
fn test_build_is_idempotent() {
    let mut qb = select("Person", "p")
        .where_params(
            ParameterSet::new()
                .with("name", "Ann")
                .with("age", Condition::between(18, 65))
                .order_by("age", true),
        )
        .left_join("p.address a");
    let first = qb.build().unwrap();
    let second = qb.build().unwrap();
    assert_eq!(first, second);
    assert_eq!(qb.to_query_string().unwrap(), first.sql);
    assert!(qb.is_built());
}

#[test]
fn test_repeated_configure_does_not_duplicate() {
    let mut qb = select("Person", "p").where_params(ParameterSet::new().with("age", 3));
    qb.configure_parameters().unwrap();
    qb.configure_parameters().unwrap();
    assert_eq!(qb.wheres(), ["p.age = :age"]);
    assert_eq!(qb.bindings().len(), 1);
}

#[test]
fn test_update_is_idempotent() {
    let mut qb = update("Person", "p").set([("age", 30)]);
    let first = qb.build().unwrap();
    let second = qb.build().unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(second.bindings.len(), 1);
}

#[test]
fn test_fragment_dedup() {
    let query = select("Person", "p")
        .where_raw("p.age > 18")
        .and_raw("p.age > 18")
        .inner_join("p.address a")
        .inner_join("p.address a")
        .order_by("name")
        .order_by("name")
        .group_by("city")
        .group_by("city")
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p inner join p.address a where p.age > 18 group by p.city order by p.name"
    );
}

#[test]
fn test_raw_or_fragment() {
    let query = select("Person", "p")
        .where_raw("p.age > 18")
        .or_raw("p.vip = true")
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.age > 18 or p.vip = true"
    );
}

#[test]
fn test_alias_qualification() {
    let query = select_fields(["name", "p.age", "(select 1)", "person.id"])
        .from("Person", "p")
        .where_cond("p.id", Condition::gt(1))
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select p.name, p.age, (select 1), p.person.id from Person p where p.id > :pid"
    );
}

#[test]
fn test_append_alias_disabled() {
    let query = select("Person", "p")
        .append_alias(false)
        .fields(["name"])
        .where_cond("age", Condition::gte(18))
        .order_by("name")
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select name from Person p where age >= :age order by name"
    );
}

#[test]
fn test_builder_or_condition() {
    let query = select("Person", "p")
        .where_cond("age", Condition::lt(18))
        .or("age", Condition::gt(65))
        .and("active", Condition::eq(true))
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.age < :age or p.age > :age2 and p.active = :active"
    );
}

#[test]
fn test_condition_combinator_drives_where() {
    let query = select("Person", "p")
        .where_cond("age", Condition::lt(18))
        .where_cond("age", Condition::gt(65).or())
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p where p.age < :age or p.age > :age2");
}

#[test]
fn test_null_checks_and_not_in() {
    let query = select("Person", "p")
        .where_cond("deletedAt", Condition::is_null())
        .and("email", Condition::is_not_null())
        .and("status", Condition::not_in(vec!["banned", "closed"]))
        .and("code", Condition::ne("X"))
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.deletedAt is null and p.email is not null and p.status not in (:status) and p.code <> :code"
    );
    assert_eq!(query.bindings.len(), 2);
}

#[test]
fn test_subquery_condition() {
    let query = select("Person", "p")
        .where_cond(
            "id",
            Condition::in_subquery_with(
                "select o.personId from Order o where o.total > :minTotal",
                [("minTotal", 100)],
            ),
        )
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.id in (select o.personId from Order o where o.total > :minTotal)"
    );
    assert_eq!(query.param("minTotal"), Some(&Value::Int(100)));
}

#[test]
fn test_correlated_subquery_still_qualifies_field() {
    let query = select("Person", "p")
        .where_cond(
            "id",
            Condition::in_subquery("select o.personId from Order o where o.ownerId = p.id"),
        )
        .where_cond("name", Condition::like("p.nick"))
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select p from Person p where p.id in (select o.personId from Order o where o.ownerId = p.id) and p.name like :name"
    );
    assert_eq!(query.param("name"), Some(&Value::Text("%p.nick%".into())));
}

#[test]
fn test_subquery_conflict_is_reported_by_build() {
    let err = select("Person", "p")
        .where_cond("minTotal", Condition::eq(5))
        .and(
            "id",
            Condition::in_subquery_with(
                "select o.id from Order o where o.total > :minTotal",
                [("minTotal", 100)],
            ),
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::PlaceholderConflict(ref key) if key == "minTotal"));
}

#[test]
fn test_result_type_projection() {
    let query = select_as("PersonDto", "Person", "p")
        .fields(["name", "age"])
        .build()
        .unwrap();
    assert_eq!(query.sql, "select new PersonDto(p.name, p.age) from Person p");
}

#[test]
fn test_create_projection() {
    let mut qb = select("Parameter", "p")
        .left_join("p.test t")
        .where_cond("p.id", Condition::gt(1))
        .order_by("name");
    let sql = qb.create_projection("count", "id").unwrap();
    assert_eq!(
        sql,
        "select count(p.id) from Parameter p left join p.test t where p.id > :pid"
    );
}

#[test]
fn test_create_projection_on_update_fails() {
    let err = update("Person", "p")
        .create_projection("count", "id")
        .unwrap_err();
    assert!(matches!(err, QueryError::WrongMode { .. }));
}

#[test]
fn test_custom_select_and_from() {
    let query = select("Person", "p")
        .custom_select("select distinct p.city")
        .custom_from("Person p, Country c")
        .where_raw("p.countryId = c.id")
        .build()
        .unwrap();
    assert_eq!(
        query.sql,
        "select distinct p.city from Person p, Country c where p.countryId = c.id"
    );
}

#[test]
fn test_missing_root_type() {
    let err = select_fields(["name"]).build().unwrap_err();
    assert!(matches!(err, QueryError::MissingRootType(QueryMode::Select)));
}

#[test]
fn test_from_parameters() {
    let query = from_parameters("Person", "p", ParameterSet::new().with("age", 40))
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p where p.age = :age");
}

#[test]
fn test_null_literal_is_skipped() {
    let query = select("Person", "p")
        .where_params(
            ParameterSet::new()
                .with("name", None::<String>)
                .with("age", 3),
        )
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p where p.age = :age");
}

#[test]
fn test_pagination_carried_to_built_query() {
    let mut params = ParameterSet::new().with("age", 3);
    params.set_paginator(Paginator::new(3, 25));
    let query = select("Person", "p").where_params(params).build().unwrap();
    assert_eq!(query.first_result, Some(50));
    assert_eq!(query.max_results, Some(25));
}

#[test]
fn test_lazy_parameters_have_root_type() {
    let mut qb = select("Person", "p");
    let params = qb.parameters();
    assert_eq!(params.borrow().root_type(), Some("Person"));
    params.borrow_mut().insert("age", 3);
    assert_eq!(
        qb.to_query_string().unwrap(),
        "select p from Person p where p.age = :age"
    );
}

#[test]
fn test_clone_isolates_fragments() {
    let mut original = select("Person", "p").where_cond("age", Condition::gt(18));
    let before = original.clone().to_query_string().unwrap();

    let mut clone = original.clone();
    assert_eq!(clone.to_query_string().unwrap(), before);

    let mut extended = original.clone().and("name", Condition::eq("Ann"));
    assert_eq!(
        extended.to_query_string().unwrap(),
        "select p from Person p where p.age > :age and p.name = :name"
    );
    assert_eq!(original.to_query_string().unwrap(), before);
}

#[test]
fn test_clone_of_built_renders_identically() {
    let mut original = select("Person", "p").where_params(ParameterSet::new().with("age", 1));
    let built = original.build().unwrap();
    let mut clone = original.clone();
    assert_eq!(clone.build().unwrap(), built);
}

#[test]
fn test_clone_shares_parameters() {
    let mut original = select("Person", "p");
    let shared = original.parameters();
    let mut clone = original.clone();

    shared.borrow_mut().insert("age", 3);
    assert_eq!(
        clone.to_query_string().unwrap(),
        "select p from Person p where p.age = :age"
    );
    assert_eq!(
        original.to_query_string().unwrap(),
        "select p from Person p where p.age = :age"
    );
}

#[test]
fn test_insertion_order_drives_rendering() {
    let a = ParameterSet::new()
        .with("name", Condition::eq("Ann"))
        .with("age", Condition::gt(1));
    let b = ParameterSet::new()
        .with("age", Condition::gt(1))
        .with("name", Condition::eq("Ann"));

    let sql_a = select("Person", "p").where_params(a).build().unwrap().sql;
    let sql_b = select("Person", "p").where_params(b).build().unwrap().sql;
    assert_eq!(sql_a, "select p from Person p where p.name = :name and p.age > :age");
    assert_eq!(sql_b, "select p from Person p where p.age > :age and p.name = :name");
}

#[test]
fn test_with_config_defaults() {
    let config = CompilerConfig::default()
        .with_default_alias("e")
        .with_auto_wildcard_strings(false);
    let mut qb = select_fields(["name"])
        .from("Person", "")
        .with_config(&config);
    qb.parameters().borrow_mut().insert("name", "Ann");
    assert_eq!(
        qb.to_query_string().unwrap(),
        "select e.name from Person e where e.name = :name"
    );
}

#[test]
fn test_entity_helpers() {
    struct Person;

    impl Entity for Person {
        const ENTITY_NAME: &'static str = "Person";
    }

    let query = select_entity::<Person>("p")
        .result_type(ResultType::RowMap)
        .build()
        .unwrap();
    assert_eq!(query.sql, "select p from Person p");
}

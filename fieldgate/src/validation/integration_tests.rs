//! End-to-end validation scenarios across declaration, registry and engine.

#[cfg(test)]
mod tests {
    use crate::errors::{FieldgateError, NonTrivialDependency};
    use crate::objects::{FieldCatalog, ObjectField, TypeHierarchy, TypeKey};
    use crate::registry::ValidatorRegistry;
    use crate::testing::{
        assert_child_messages, assert_messages, assert_no_child, assert_validation_failed, Record,
    };
    use crate::validation::{
        Arguments, CheckError, KnownFieldDependencies, PendingValidators, Signature,
        ValidationError, ValidatorBuilder, YieldedError,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn catalog() -> FieldCatalog {
        let catalog = FieldCatalog::new();
        catalog
            .define(
                "Foo",
                [
                    ObjectField::new("x").with_alias("X"),
                    ObjectField::new("y").with_alias("Y"),
                ],
            )
            .unwrap();
        catalog
            .define(
                "Order",
                [
                    ObjectField::new("a"),
                    ObjectField::new("b"),
                    ObjectField::new("c"),
                    ObjectField::new("unit_price")
                        .with_alias("unitPrice")
                        .with_declared_name("price"),
                ],
            )
            .unwrap();
        catalog
    }

    fn registry() -> ValidatorRegistry<Record> {
        ValidatorRegistry::builder().fields(Arc::new(catalog())).build()
    }

    fn failing(message: &'static str) -> impl Fn(&Record, &Arguments) -> Result<(), CheckError> {
        move |_: &Record, _: &Arguments| Err(CheckError::invalid(message))
    }

    #[test]
    fn test_target_field_and_reader_both_report() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("check_x", Signature::method())
                    .field("x")
                    .check(failing("bad x"))
                    .unwrap(),
                "Foo",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("check_y", Signature::method())
                    .reads(["y"])
                    .check(failing("bad y"))
                    .unwrap(),
                "Foo",
            )
            .unwrap();

        let foo = Record::new("Foo").with("x", json!(1)).with("y", json!(2));
        let error = assert_validation_failed(registry.validate(&foo, None));

        assert_messages(&error, &["bad y"]);
        assert_child_messages(&error, "X", &["bad x"]);
        assert_no_child(&error, "x");
    }

    #[test]
    fn test_discard_skips_dependents_only() {
        let registry = registry();
        let dependent_runs = Arc::new(AtomicUsize::new(0));
        let runs = Arc::clone(&dependent_runs);

        registry
            .register(
                ValidatorBuilder::new("check_a", Signature::method())
                    .field("a")
                    .discard(["b"])
                    .check(failing("a broken"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("uses_b", Signature::method())
                    .reads(["b"])
                    .check(move |_: &Record, _| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Err(CheckError::invalid("b broken"))
                    })
                    .unwrap(),
                "Order",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("uses_c", Signature::method())
                    .reads(["c"])
                    .check(failing("c broken"))
                    .unwrap(),
                "Order",
            )
            .unwrap();

        let order = Record::new("Order");
        let error = assert_validation_failed(registry.validate(&order, None));

        assert_eq!(dependent_runs.load(Ordering::SeqCst), 0);
        assert_child_messages(&error, "a", &["a broken"]);
        assert_messages(&error, &["c broken"]);
    }

    #[test]
    fn test_discard_by_declared_name_prunes_identifier_readers() {
        let registry: ValidatorRegistry<Record> = ValidatorRegistry::builder()
            .fields(Arc::new(catalog()))
            .dependencies(Arc::new(KnownFieldDependencies::new(Arc::new(catalog()))))
            .build();

        registry
            .register(
                ValidatorBuilder::new("price_positive", Signature::method())
                    .field("price")
                    .check(failing("must be positive"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        let pruned = registry
            .register(
                ValidatorBuilder::new("price_rounded", Signature::method())
                    .reads(["price", "not_a_field"])
                    .check(failing("must be rounded"))
                    .unwrap(),
                "Order",
            )
            .unwrap();

        assert_eq!(
            pruned.dependencies().iter().collect::<Vec<_>>(),
            vec!["unit_price"]
        );

        let error = assert_validation_failed(registry.validate(&Record::new("Order"), None));
        assert_eq!(
            error,
            ValidationError::new()
                .with_child("unitPrice", ValidationError::message("must be positive"))
        );
    }

    #[test]
    fn test_default_registry_prunes_readers_of_declared_name() {
        let registry = registry();
        let dependent_runs = Arc::new(AtomicUsize::new(0));
        let runs = Arc::clone(&dependent_runs);

        registry
            .register(
                ValidatorBuilder::new("price_positive", Signature::method())
                    .field("price")
                    .check(failing("must be positive"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        let dependent = registry
            .register(
                ValidatorBuilder::new("price_rounded", Signature::method())
                    .reads(["price"])
                    .check(move |_: &Record, _| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Err(CheckError::invalid("must be rounded"))
                    })
                    .unwrap(),
                "Order",
            )
            .unwrap();

        assert_eq!(
            dependent.dependencies().iter().collect::<Vec<_>>(),
            vec!["unit_price"]
        );

        let order = Record::new("Order");
        let error = assert_validation_failed(registry.validate(&order, None));
        assert_eq!(dependent_runs.load(Ordering::SeqCst), 0);
        assert_messages(&error, &[]);
        assert_child_messages(&error, "unitPrice", &["must be positive"]);
    }

    #[test]
    fn test_discards_accumulate_and_never_undo_earlier_runs() {
        let registry = registry();
        let skipped_runs = Arc::new(AtomicUsize::new(0));

        registry
            .register(
                ValidatorBuilder::new("early_reads_b", Signature::method())
                    .reads(["b"])
                    .check(failing("early b"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("check_a", Signature::method())
                    .field("a")
                    .discard(["b"])
                    .check(failing("a broken"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("check_c", Signature::method())
                    .field("c")
                    .check(failing("c broken"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        for (name, field) in [("late_reads_b", "b"), ("late_reads_c", "c")] {
            let runs = Arc::clone(&skipped_runs);
            registry
                .register(
                    ValidatorBuilder::new(name, Signature::method())
                        .reads([field])
                        .check(move |_: &Record, _| {
                            runs.fetch_add(1, Ordering::SeqCst);
                            Err(CheckError::invalid("should not run"))
                        })
                        .unwrap(),
                    "Order",
                )
                .unwrap();
        }
        registry
            .register(
                ValidatorBuilder::new("reads_unit_price", Signature::method())
                    .reads(["unit_price"])
                    .check(failing("price checked"))
                    .unwrap(),
                "Order",
            )
            .unwrap();

        let order = Record::new("Order");
        let error = assert_validation_failed(registry.validate(&order, None));

        assert_eq!(skipped_runs.load(Ordering::SeqCst), 0);
        assert_messages(&error, &["early b", "price checked"]);
        assert_child_messages(&error, "a", &["a broken"]);
        assert_child_messages(&error, "c", &["c broken"]);
        assert_eq!(
            error.children.keys().collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }

    #[test]
    fn test_successful_validation_returns_same_instance() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("has_x", Signature::method())
                    .check(|r: &Record, _| {
                        if r.has("x") {
                            Ok(())
                        } else {
                            Err(CheckError::invalid("x required"))
                        }
                    })
                    .unwrap(),
                "Foo",
            )
            .unwrap();

        let foo = Record::new("Foo").with("x", json!("set"));
        let validated = registry.validate(&foo, None).unwrap();
        assert!(std::ptr::eq(validated, &foo));
    }

    #[test]
    fn test_partial_dispatch_filters_arguments() {
        let registry = registry();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_check = Arc::clone(&seen);

        registry
            .register(
                ValidatorBuilder::new("max_qty", Signature::method().param("limit"))
                    .check(move |r: &Record, args: &Arguments| {
                        seen_by_check.store(args.len(), Ordering::SeqCst);
                        let limit: i64 = args.require_as("limit")?;
                        if r.get_i64("qty").unwrap_or(0) > limit {
                            return Err(CheckError::invalid(format!("qty above {limit}")));
                        }
                        Ok(())
                    })
                    .unwrap(),
                "Order",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("no_args", Signature::method())
                    .check(|_: &Record, args: &Arguments| {
                        assert!(args.is_empty());
                        Ok(())
                    })
                    .unwrap(),
                "Order",
            )
            .unwrap();

        let args = Arguments::new()
            .with("limit", json!(5))
            .with("currency", json!("EUR"));
        let order = Record::new("Order").with("qty", json!(7));
        let error = assert_validation_failed(registry.validate(&order, Some(&args)));

        assert_messages(&error, &["qty above 5"]);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_exact_arguments_are_passed_through() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("window", Signature::method().param("from").param("to"))
                    .check(|_: &Record, args: &Arguments| {
                        let from: i64 = args.require_as("from")?;
                        let to: i64 = args.require_as("to")?;
                        if from > to {
                            return Err(CheckError::invalid("empty window"));
                        }
                        Ok(())
                    })
                    .unwrap(),
                "Order",
            )
            .unwrap();

        let args = Arguments::new().with("from", json!(1)).with("to", json!(3));
        assert!(registry.validate(&Record::new("Order"), Some(&args)).is_ok());
    }

    #[test]
    fn test_missing_argument_is_an_assertion() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("paged", Signature::method().param("offset"))
                    .check(|_: &Record, _| Ok(()))
                    .unwrap(),
                "Order",
            )
            .unwrap();

        let args = Arguments::new().with("limit", json!(10));
        let order = Record::new("Order");
        let result = registry.validate(&order, Some(&args));
        assert!(matches!(
            result,
            Err(FieldgateError::Assertion(msg)) if msg.contains("offset")
        ));
    }

    #[test]
    fn test_non_trivial_dependency_names_the_validator() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("first", Signature::method())
                    .check(failing("collected but lost"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("totals", Signature::method())
                    .check(|_: &Record, _| Err(NonTrivialDependency::new("total").into()))
                    .unwrap(),
                "Order",
            )
            .unwrap();

        match registry.validate(&Record::new("Order"), None) {
            Err(FieldgateError::NonTrivialDependency(dep)) => {
                assert_eq!(dep.attribute, "total");
                assert_eq!(dep.validator.as_deref(), Some("totals"));
            }
            other => panic!("expected non-trivial dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_check_assertion_propagates_after_failures() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("soft", Signature::method())
                    .check(failing("soft failure"))
                    .unwrap(),
                "Order",
            )
            .unwrap();
        registry
            .register(
                ValidatorBuilder::new("hard", Signature::method())
                    .check(|_: &Record, _| Err(CheckError::assertion("unreachable state")))
                    .unwrap(),
                "Order",
            )
            .unwrap();

        assert!(matches!(
            registry.validate(&Record::new("Order"), None),
            Err(FieldgateError::Assertion(_))
        ));
    }

    #[test]
    fn test_other_errors_become_messages() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("parse", Signature::method())
                    .field("x")
                    .check(|r: &Record, _| {
                        let raw = r.get_str("x").unwrap_or_default();
                        raw.parse::<i64>().map_err(anyhow::Error::from)?;
                        Ok(())
                    })
                    .unwrap(),
                "Foo",
            )
            .unwrap();

        let foo = Record::new("Foo").with("x", json!("abc"));
        let error = assert_validation_failed(registry.validate(&foo, None));
        assert_messages(&error, &["invalid digit found in string"]);
        assert_no_child(&error, "X");
    }

    #[test]
    fn test_yielding_check_reports_every_problem() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("lines", Signature::method())
                    .field("c")
                    .discard(Vec::<&str>::new())
                    .yielding(|_: &Record, _| {
                        vec![
                            YieldedError::from("missing sku"),
                            YieldedError::at(["0", "qty"], "must be positive"),
                        ]
                    })
                    .unwrap(),
                "Order",
            )
            .unwrap();

        let error = assert_validation_failed(registry.validate(&Record::new("Order"), None));
        let flat: Vec<String> = error.flatten().iter().map(ToString::to_string).collect();
        assert_eq!(
            flat,
            vec![
                "c: missing sku".to_string(),
                "c.0.qty: must be positive".to_string()
            ]
        );
    }

    #[test]
    fn test_inherited_and_aliased_validators_apply() {
        let hierarchy = TypeHierarchy::new();
        hierarchy.declare("Base", Vec::<TypeKey>::new()).unwrap();
        hierarchy.declare("Child", ["Base"]).unwrap();
        hierarchy.alias("Child", "Model").unwrap();

        let registry: ValidatorRegistry<Record> = ValidatorRegistry::builder()
            .relations(Arc::new(hierarchy))
            .build();
        for (name, owner) in [("model", "Model"), ("base", "Base"), ("child", "Child")] {
            registry
                .register(
                    ValidatorBuilder::new(name, Signature::method())
                        .check(failing(name))
                        .unwrap(),
                    owner,
                )
                .unwrap();
        }

        let error = assert_validation_failed(registry.validate(&Record::new("Child"), None));
        assert_messages(&error, &["child", "base", "model"]);

        let base_only = assert_validation_failed(registry.validate(&Record::new("Base"), None));
        assert_messages(&base_only, &["base"]);
    }

    #[test]
    fn test_pending_validators_finalize_in_order() {
        let registry = registry();
        let pending = PendingValidators::new()
            .with(
                ValidatorBuilder::new("first", Signature::method())
                    .check(failing("first"))
                    .unwrap(),
            )
            .unwrap()
            .with(
                ValidatorBuilder::new("second", Signature::method())
                    .check(failing("second"))
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(pending.len(), 2);

        let registered = pending.finalize(&registry, "Foo").unwrap();
        assert!(registered
            .iter()
            .all(|v| v.owner().map(TypeKey::as_str) == Some("Foo")));

        let error = assert_validation_failed(registry.validate(&Record::new("Foo"), None));
        assert_messages(&error, &["first", "second"]);
    }

    #[test]
    fn test_declare_infers_owner_from_instance_type() {
        let registry = registry();
        registry
            .declare(
                ValidatorBuilder::new("standalone", Signature::function("Foo"))
                    .check(failing("standalone"))
                    .unwrap(),
            )
            .unwrap();

        let error = assert_validation_failed(registry.validate(&Record::new("Foo"), None));
        assert_messages(&error, &["standalone"]);
        assert!(registry.validate(&Record::new("Order"), None).is_ok());
    }

    #[test]
    fn test_validation_error_serializes_for_diagnostics() {
        let registry = registry();
        registry
            .register(
                ValidatorBuilder::new("check_x", Signature::method())
                    .field("x")
                    .check(failing("bad x"))
                    .unwrap(),
                "Foo",
            )
            .unwrap();

        let foo = Record::new("Foo");
        let result = registry.validate(&foo, None);
        let Err(err) = result else {
            panic!("expected failure");
        };
        assert!(err.is_validation());
        assert_eq!(
            serde_json::to_value(err.as_validation().unwrap()).unwrap(),
            json!({"children": {"X": {"messages": ["bad x"]}}})
        );
    }
}

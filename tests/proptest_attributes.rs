//! Property-based tests using proptest
//!
//! These tests check that moving models in and out of attribute bags is
//! lossless and that planning is stable on unchanged state.

use foreman_provider::api::override_value::OverrideValue;
use foreman_provider::api::smart_class_parameter::{
    ParameterAttributes, ParameterScope, SmartClassParameter,
};
use foreman_provider::api::SearchFilter;
use foreman_provider::resources::{override_value, smart_class_parameter};
use foreman_provider::{AttributeBag, PlanResult};
use proptest::prelude::*;

/// Generate Foreman-style match expressions
fn arb_matcher() -> impl Strategy<Value = String> {
    (
        prop_oneof!["os", "domain", "hostgroup", "fqdn", "environment"],
        "[A-Za-z0-9.-]{1,24}",
    )
        .prop_map(|(key, value)| format!("{}={}", key, value))
}

fn arb_override_value() -> impl Strategy<Value = OverrideValue> {
    (
        proptest::option::of(1i64..100_000),
        1i64..100_000,
        proptest::option::of(arb_matcher()),
        proptest::option::of(".{0,32}"),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(id, parent, matcher, value, omit)| OverrideValue {
            id,
            smart_class_parameter_id: parent,
            matcher,
            value,
            omit,
        })
}

fn arb_scope() -> impl Strategy<Value = ParameterScope> {
    prop_oneof![
        (1i64..1000).prop_map(ParameterScope::Host),
        (1i64..1000).prop_map(ParameterScope::HostGroup),
        (1i64..1000).prop_map(ParameterScope::Environment),
    ]
}

fn arb_parameter() -> impl Strategy<Value = SmartClassParameter> {
    (
        1i64..100_000,
        arb_scope(),
        proptest::option::of("[a-z_]{1,20}"),
        proptest::option::of(any::<bool>()),
        proptest::option::of(".{0,32}"),
        proptest::option::of(prop_oneof!["string", "boolean", "array", "hash"]),
        proptest::option::of(prop::collection::vec(
            (arb_matcher(), ".{0,16}", any::<bool>()),
            0..5,
        )),
    )
        .prop_map(|(id, scope, name, overridable, default_value, parameter_type, values)| {
            SmartClassParameter {
                id,
                scope,
                attributes: ParameterAttributes {
                    parameter: name,
                    overridable,
                    default_value,
                    parameter_type,
                    override_values: values.map(|values| {
                        values
                            .into_iter()
                            .map(|(matcher, value, omit)| {
                                OverrideValue::new(id, matcher, value, omit)
                            })
                            .collect()
                    }),
                    ..Default::default()
                },
            }
        })
}

proptest! {
    /// Writing an override value into a bag and building it back is lossless
    #[test]
    fn override_value_bag_round_trip(value in arb_override_value()) {
        let mut bag = AttributeBag::new();
        override_value::set_from_override_value(&mut bag, &value);

        let built = override_value::build_override_value(&bag).unwrap();
        prop_assert_eq!(built, value);
    }

    /// Rewriting a bag from its own build leaves it unchanged
    #[test]
    fn parameter_bag_is_stable(parameter in arb_parameter()) {
        let mut bag = AttributeBag::new();
        smart_class_parameter::set_from_smart_class_parameter(&mut bag, &parameter);

        let built = smart_class_parameter::build_smart_class_parameter(&bag).unwrap();
        let mut rewritten = AttributeBag::new();
        smart_class_parameter::set_from_smart_class_parameter(&mut rewritten, &built);

        prop_assert_eq!(rewritten, bag);
        prop_assert_eq!(built.scope, parameter.scope);
    }

    /// Planning a state against itself yields no changes and no replacement
    #[test]
    fn plan_of_unchanged_state_is_empty(value in arb_override_value()) {
        let mut bag = AttributeBag::new();
        override_value::set_from_override_value(&mut bag, &value);
        let state = bag.into_value();

        let plan = PlanResult::diff(&override_value::schema(), Some(&state), &state);
        prop_assert!(plan.changes.is_empty());
        prop_assert!(!plan.requires_replace);
    }

    /// Search filters always quote the searched value
    #[test]
    fn search_filter_is_quoted(matcher in arb_matcher()) {
        let filter = SearchFilter::name(&matcher);
        prop_assert!(filter.as_str().starts_with("name=\""));
        prop_assert!(filter.as_str().ends_with('"'));
        prop_assert!(filter.as_str().contains(&matcher));
    }
}

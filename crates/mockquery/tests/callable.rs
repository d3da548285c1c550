//! Callable statement tests: parameters and output resolution.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mockquery::{Connection, HandlerConfig, ParamKey, ParameterMap, ResultSet, SqlValue};
use mockquery::params::parameter_map;

fn outputs() -> ParameterMap {
    parameter_map([(ParamKey::Index(1), SqlValue::from("abc"))])
}

// =============================================================================
// Output Filtering
// =============================================================================

mod outputs {
    use super::*;

    #[test]
    fn test_registered_output_visible_unregistered_absent() {
        let conn = Connection::with_config(HandlerConfig::new().must_register_out_parameters(true));
        conn.callable_statement_handler()
            .register_out_parameters("call p", outputs());

        let mut call = conn.prepare_call("{call p(?, ?)}");
        call.register_out_parameter(1);
        call.execute().unwrap();

        assert_eq!(call.get::<Option<String>>(1).unwrap().as_deref(), Some("abc"));
        assert!(!call.was_null());
        assert_eq!(call.get_object(2), None);
        assert!(call.was_null());
    }

    #[test]
    fn test_unregistered_output_hidden_when_required() {
        let conn = Connection::new();
        let handler = conn.callable_statement_handler();
        handler.set_must_register_out_parameters(true);
        handler.register_out_parameters("call p", outputs());

        let mut call = conn.prepare_call("{call p(?)}");
        call.execute().unwrap();
        assert!(call.out_parameters().is_empty());
    }

    #[test]
    fn test_named_and_indexed_outputs() {
        let conn = Connection::new();
        conn.callable_statement_handler().register_out_parameters(
            "call totals",
            parameter_map([
                (ParamKey::Index(1), SqlValue::Int(3)),
                (ParamKey::Name("sum".into()), SqlValue::from("12.5")),
                (ParamKey::Name("flag".into()), SqlValue::Null),
            ]),
        );

        let mut call = conn.prepare_call("{call totals(?, ?, ?)}");
        call.execute_update().unwrap();
        assert_eq!(call.get::<i64>(1).unwrap(), 3);
        assert!((call.get::<f64>("sum").unwrap() - 12.5).abs() < f64::EPSILON);
        assert!(!call.get::<bool>("flag").unwrap());
        assert!(call.was_null());
        assert_eq!(call.get::<i32>("SUM").unwrap(), 0);
    }

    #[test]
    fn test_empty_keyed_map_falls_through() {
        let conn = Connection::new();
        let handler = conn.callable_statement_handler();
        handler.register_out_parameters("call p", ParameterMap::new());
        handler.register_global_out_parameters(outputs());

        let mut call = conn.prepare_call("{call p}");
        call.execute().unwrap();
        assert_eq!(call.get::<String>(1).unwrap(), "abc");
    }

    #[test]
    fn test_outputs_after_query() {
        let conn = Connection::new();
        let handler = conn.callable_statement_handler();
        handler.set_returns_result_set("call report", true);
        handler.register_result_set("call report", ResultSet::new("report"));
        handler.register_out_parameters("call report", outputs());

        let mut call = conn.prepare_call("{call report(?)}");
        assert!(call.execute().unwrap());
        assert_eq!(call.result_set().unwrap().id(), "report");
        assert_eq!(call.get::<String>(1).unwrap(), "abc");
    }
}

// =============================================================================
// Input Parameters
// =============================================================================

mod inputs {
    use super::*;

    #[test]
    fn test_named_parameters_select_response() {
        let conn = Connection::new();
        let handler = conn.callable_statement_handler();
        handler.register_update_count_with_parameters(
            "call grant",
            parameter_map([(ParamKey::Name("role".into()), SqlValue::from("admin"))]),
            1,
        );

        let mut call = conn.prepare_call("{call grant(?, ?)}");
        call.set(1, 42);
        call.set("role", "admin");
        assert_eq!(call.execute_update().unwrap(), 1);

        call.set("role", "Admin");
        assert_eq!(call.execute_update().unwrap(), 0);
    }

    #[test]
    fn test_parameter_views() {
        let conn = Connection::new();
        let mut call = conn.prepare_call("{call p(?, ?)}");
        call.set(1, 1);
        call.set("1", "one");
        call.set_null(2);

        assert_eq!(call.indexed_parameters().len(), 2);
        assert_eq!(call.named_parameters().len(), 1);
        assert_eq!(call.parameters().len(), 3);
        assert_eq!(call.parameter(2), Some(&SqlValue::Null));

        call.clear_parameters();
        assert!(call.parameters().is_empty());
    }
}

//! Batch execution tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use mockquery::{
    Connection, EXECUTE_FAILED, Error, HandlerConfig, ParamKey, SqlError, SqlValue,
    params::parameter_map,
};
use proptest::prelude::*;

fn failing_connection(continue_on_failure: bool) -> Connection {
    let conn = Connection::with_config(
        HandlerConfig::new()
            .exact()
            .continue_on_batch_failure(continue_on_failure),
    );
    conn.statement_handler()
        .register_error("fail", SqlError::new("item failed").with_error_code(7));
    conn
}

// =============================================================================
// Plain Statements
// =============================================================================

mod plain {
    use super::*;

    #[test]
    fn test_counts_in_order() {
        let conn = Connection::new();
        let handler = conn.statement_handler();
        handler.register_update_count("update a", 1);
        handler.register_update_count("update b", 2);
        let mut stmt = conn.create_statement();
        stmt.add_batch("update b");
        stmt.add_batch("update a");
        stmt.add_batch("insert c");
        assert_eq!(stmt.execute_batch().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_empty_batch() {
        let conn = Connection::new();
        let mut stmt = conn.create_statement();
        assert!(stmt.execute_batch().unwrap().is_empty());
        assert!(conn.statement_handler().executed_statements().is_empty());
    }

    #[test]
    fn test_stop_at_first_failure() {
        let conn = failing_connection(false);
        let mut stmt = conn.create_statement();
        for sql in ["a", "b", "fail", "c"] {
            stmt.add_batch(sql);
        }

        let err = stmt.execute_batch().unwrap_err();
        assert!(err.is_batch_failure());
        assert_eq!(err.update_counts(), Some(&[0, 0, EXECUTE_FAILED][..]));
        assert_eq!(err.message(), "item failed");
        assert_eq!(err.error_code(), 7);
        assert_eq!(conn.statement_handler().executed_statements(), ["a", "b"]);
    }

    #[test]
    fn test_continue_after_failure() {
        let conn = failing_connection(true);
        let mut stmt = conn.create_statement();
        for sql in ["a", "fail", "b"] {
            stmt.add_batch(sql);
        }

        let err = stmt.execute_batch().unwrap_err();
        assert_eq!(err.update_counts(), Some(&[0, EXECUTE_FAILED, 0][..]));
        assert_eq!(conn.statement_handler().executed_statements(), ["a", "b"]);
    }

    #[test]
    fn test_query_item_rejected() {
        let conn = Connection::new();
        let mut stmt = conn.create_statement();
        stmt.add_batch("update t");
        stmt.add_batch("select * from t");

        match stmt.execute_batch().unwrap_err() {
            Error::BatchUpdate {
                message,
                update_counts,
                ..
            } => {
                assert_eq!(update_counts, vec![0, EXECUTE_FAILED]);
                assert!(message.contains("select * from t"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(conn.statement_handler().executed_statements(), ["update t"]);
    }

    #[test]
    fn test_batch_kept_after_execution() {
        let conn = Connection::new();
        let mut stmt = conn.create_statement();
        stmt.add_batch("update t");
        stmt.execute_batch().unwrap();
        assert_eq!(stmt.batch(), ["update t"]);
        stmt.execute_batch().unwrap();
        assert_eq!(conn.statement_handler().executed_statements().len(), 2);
        stmt.clear_batch();
        assert!(stmt.batch().is_empty());
    }

    #[test]
    fn test_continue_flag_read_at_execution() {
        let conn = failing_connection(false);
        let mut stmt = conn.create_statement();
        stmt.add_batch("fail");
        stmt.add_batch("a");
        conn.statement_handler().set_continue_on_batch_failure(true);
        let err = stmt.execute_batch().unwrap_err();
        assert_eq!(err.update_counts().unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_counts_match_items(counts in proptest::collection::vec(0i32..1000, 0..16)) {
            let conn = Connection::with_config(HandlerConfig::new().exact());
            let mut stmt = conn.create_statement();
            for (i, count) in counts.iter().enumerate() {
                let sql = format!("update t{i}");
                conn.statement_handler().register_update_count(sql.clone(), *count);
                stmt.add_batch(sql);
            }
            prop_assert_eq!(stmt.execute_batch().unwrap(), counts);
        }

        #[test]
        fn prop_stop_truncates_at_failure(len in 1usize..12, seed in any::<usize>()) {
            let failing = seed % len;
            let conn = failing_connection(false);
            let mut stmt = conn.create_statement();
            for i in 0..len {
                stmt.add_batch(if i == failing { "fail".to_owned() } else { format!("u{i}") });
            }
            let err = stmt.execute_batch().unwrap_err();
            let results = err.update_counts().unwrap();
            prop_assert_eq!(results.len(), failing + 1);
            prop_assert_eq!(results[failing], EXECUTE_FAILED);
            prop_assert_eq!(conn.statement_handler().executed_statements().len(), failing);
        }

        #[test]
        fn prop_continue_runs_every_other_item(len in 1usize..12, seed in any::<usize>()) {
            let failing = seed % len;
            let conn = failing_connection(true);
            let mut stmt = conn.create_statement();
            for i in 0..len {
                stmt.add_batch(if i == failing { "fail".to_owned() } else { format!("u{i}") });
            }
            let err = stmt.execute_batch().unwrap_err();
            let results = err.update_counts().unwrap();
            prop_assert_eq!(results.len(), len);
            prop_assert_eq!(results[failing], EXECUTE_FAILED);
            let executed = conn.statement_handler().executed_statements();
            prop_assert_eq!(executed.len(), len - 1);
            for i in (0..len).filter(|i| *i != failing) {
                let sql = format!("u{i}");
                prop_assert_eq!(executed.iter().filter(|s| **s == sql).count(), 1);
            }
        }
    }
}

// =============================================================================
// Prepared and Callable Statements
// =============================================================================

mod parameterized {
    use super::*;

    #[test]
    fn test_prepared_failure_keyed_by_parameters() {
        let conn = Connection::new();
        conn.prepared_statement_handler().register_error_with_parameters(
            "insert",
            parameter_map([(ParamKey::Index(1), SqlValue::from("bad"))]),
            SqlError::new("constraint violation"),
        );
        let mut stmt = conn.prepare_statement("insert into t values (?)");
        for value in ["ok", "bad", "ok"] {
            stmt.set(1, value);
            stmt.add_batch();
        }

        let err = stmt.execute_batch().unwrap_err();
        assert_eq!(err.update_counts(), Some(&[0, EXECUTE_FAILED][..]));
        assert_eq!(err.message(), "constraint violation");
    }

    #[test]
    fn test_callable_batch_leaves_outputs_alone() {
        let conn = Connection::new();
        let handler = conn.callable_statement_handler();
        handler.register_update_count("call bump", 1);
        handler.register_global_out_parameters(parameter_map([(
            ParamKey::Index(1),
            SqlValue::Int(5),
        )]));

        let mut call = conn.prepare_call("{call bump(?)}");
        call.set(1, 10);
        call.add_batch();
        call.set(1, 11);
        call.add_batch();
        assert_eq!(call.execute_batch().unwrap(), vec![1, 1]);
        assert!(call.out_parameters().is_empty());

        let executed = handler.executed_statement_parameters();
        assert_eq!(executed.len(), 2);
        assert_eq!(
            executed[0].parameters.get(&ParamKey::Index(1)),
            Some(&SqlValue::Int(10))
        );
    }
}

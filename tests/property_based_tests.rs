mod common;

use common::strategies::*;
use proptest::prelude::*;
use rowcache_invalidator::cache::CacheKey;
use rowcache_invalidator::events::SqlValue;
use rowcache_invalidator::parser::{DdlAction, DdlParser, KeywordDdlParser, KeywordStatementParser, Statement, StatementParser};
use rowcache_invalidator::position::{Gtid, ReplicationPosition};
use rowcache_invalidator::schema::{ColumnKind, PkColumn};

proptest! {
    /// Property: Distinct primary-key tuples never share a cache key
    #[test]
    fn distinct_tuples_have_distinct_keys(
        a in composite_tuple_strategy(),
        b in composite_tuple_strategy(),
    ) {
        let columns = composite_columns();
        let key_a = CacheKey::build(&columns, &a).unwrap();
        let key_b = CacheKey::build(&columns, &b).unwrap();
        prop_assert_eq!(a == b, key_a == key_b, "{:?} / {:?} -> {} / {}", a, b, key_a, key_b);
    }

    /// Property: Key building is deterministic
    #[test]
    fn key_building_is_deterministic(tuple in composite_tuple_strategy()) {
        let columns = composite_columns();
        prop_assert_eq!(
            CacheKey::build(&columns, &tuple).unwrap(),
            CacheKey::build(&columns, &tuple).unwrap()
        );
    }

    /// Property: Integer keys are the plain decimal value
    #[test]
    fn integer_keys_are_decimal(id in any::<i64>()) {
        let columns = vec![PkColumn::new("id", ColumnKind::Integer)];
        let key = CacheKey::build(&columns, &[SqlValue::Int(id)]).unwrap();
        prop_assert_eq!(key.as_str(), id.to_string());
    }

    /// Property: Appending GTIDs in any order never loses a transaction and
    /// never moves the position backwards
    #[test]
    fn position_append_is_monotonic(sequences in sequence_strategy()) {
        let server = uuid::Uuid::new_v4();
        let mut position = ReplicationPosition::new();
        for sequence in &sequences {
            let before = position.clone();
            position.append(&Gtid::new(server, *sequence));
            prop_assert!(position.at_least(&before));
        }
        for sequence in &sequences {
            prop_assert!(position.contains(&Gtid::new(server, *sequence)));
        }

        let unique: std::collections::BTreeSet<u64> = sequences.iter().copied().collect();
        prop_assert_eq!(position.transaction_count(), unique.len() as u64);
    }

    /// Property: Appending a GTID twice is the same as appending it once
    #[test]
    fn position_append_is_idempotent(sequences in sequence_strategy(), repeat in 1u64..200) {
        let server = uuid::Uuid::new_v4();
        let mut position = ReplicationPosition::new();
        for sequence in &sequences {
            position.append(&Gtid::new(server, *sequence));
        }
        let once = position.appended(&Gtid::new(server, repeat));
        let twice = once.appended(&Gtid::new(server, repeat));
        prop_assert_eq!(once, twice);
    }

    /// Property: Renames of any quoted identifier plan drop-old then load-new
    #[test]
    fn rename_plans_use_both_names(from in identifier_strategy(), to in identifier_strategy()) {
        let plan = KeywordDdlParser::new().parse(&format!("RENAME TABLE `{from}` TO `{to}`"));
        prop_assert_eq!(plan.action, Some(DdlAction::Rename));
        prop_assert_eq!(plan.table_name, Some(from));
        prop_assert_eq!(plan.new_name, Some(to));
    }

    /// Property: UPDATE statements always resolve their target table
    #[test]
    fn update_statements_resolve_table(table in identifier_strategy(), column in identifier_strategy()) {
        let statement = KeywordStatementParser::new()
            .parse(&format!("UPDATE `{table}` SET `{column}` = 1"))
            .unwrap();
        match statement {
            Statement::Update { tables } => {
                prop_assert_eq!(tables.len(), 1);
                prop_assert_eq!(&tables[0].name, &table);
            }
            other => prop_assert!(false, "unexpected statement {:?}", other),
        }
    }

    /// Property: joined UPDATEs resolve every joined table, in order
    #[test]
    fn joined_updates_resolve_every_table(left in identifier_strategy(), right in identifier_strategy()) {
        prop_assume!(left != right);
        let statement = KeywordStatementParser::new()
            .parse(&format!("UPDATE `{left}` JOIN `{right}` ON 1 = 1 SET `{right}`.`v` = 1"))
            .unwrap();
        let names: Vec<&str> = statement.tables().iter().map(|t| t.name.as_str()).collect();
        prop_assert_eq!(names, vec![left.as_str(), right.as_str()]);
    }
}

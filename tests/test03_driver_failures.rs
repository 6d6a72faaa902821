use std::cell::RefCell;
use std::rc::Rc;

use sql_resultset::prelude::*;
use sql_resultset::{Driver, DriverConnection};

/// Which driver calls should fail, and a log of what was called.
#[derive(Default)]
struct Script {
    fail_open: bool,
    fail_close: bool,
    fail_set_auto_commit_on: Option<bool>,
    fail_commit: bool,
    fail_rollback: bool,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
struct ScriptedDriver(Rc<RefCell<Script>>);

struct ScriptedConnection(Rc<RefCell<Script>>);

fn outcome(fail: bool, what: &str) -> Result<(), DriverError> {
    if fail {
        Err(DriverError::Other(format!("{what} failed")))
    } else {
        Ok(())
    }
}

impl Driver for ScriptedDriver {
    fn open(&self, _config: &DataSourceConfig) -> Result<Box<dyn DriverConnection>, DriverError> {
        let mut script = self.0.borrow_mut();
        script.calls.push("open".into());
        outcome(script.fail_open, "open")?;
        Ok(Box::new(ScriptedConnection(Rc::clone(&self.0))))
    }
}

impl DriverConnection for ScriptedConnection {
    fn close(self: Box<Self>) -> Result<(), DriverError> {
        let mut script = self.0.borrow_mut();
        script.calls.push("close".into());
        outcome(script.fail_close, "close")
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        let mut script = self.0.borrow_mut();
        script.calls.push(format!("set_auto_commit({enabled})"));
        outcome(script.fail_set_auto_commit_on == Some(enabled), "set_auto_commit")
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        let mut script = self.0.borrow_mut();
        script.calls.push("commit".into());
        outcome(script.fail_commit, "commit")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        let mut script = self.0.borrow_mut();
        script.calls.push("rollback".into());
        outcome(script.fail_rollback, "rollback")
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultTable, DriverError> {
        self.0.borrow_mut().calls.push(format!("query({sql})"));
        let mut table = ResultTable::with_columns(vec!["echo".into()]);
        for p in params {
            table.push_values(vec![p.clone()])?;
        }
        Ok(table)
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, DriverError> {
        self.0.borrow_mut().calls.push(format!("execute({sql})"));
        Ok(params.len())
    }
}

fn scripted(configure: impl FnOnce(&mut Script)) -> (DataAccess, ScriptedDriver) {
    let driver = ScriptedDriver::default();
    configure(&mut driver.0.borrow_mut());
    let cfg = DataSourceConfig::new("scripted", "mem://test", "", "");
    (DataAccess::with_driver(cfg, driver.clone()), driver)
}

fn calls(driver: &ScriptedDriver) -> Vec<String> {
    driver.0.borrow().calls.clone()
}

#[test]
fn commit_failure_still_restores_auto_commit() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, driver) = scripted(|s| s.fail_commit = true);
    db.connect()?;
    db.begin_transaction()?;

    let err = db.commit().unwrap_err();
    assert!(matches!(
        err,
        SqlAccessError::Transaction {
            source: DriverError::Other(_),
            restore: None
        }
    ));
    assert!(db.is_auto_commit());
    assert_eq!(
        calls(&driver),
        ["open", "set_auto_commit(false)", "commit", "set_auto_commit(true)"]
    );
    Ok(())
}

#[test]
fn rollback_and_restore_failures_are_both_reported() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, _driver) = scripted(|s| {
        s.fail_rollback = true;
        s.fail_set_auto_commit_on = Some(true);
    });
    db.connect()?;
    db.begin_transaction()?;

    let err = db.rollback().unwrap_err();
    let SqlAccessError::Transaction { source, restore } = &err else {
        panic!("expected a transaction error, got {err:?}");
    };
    assert_eq!(source.to_string(), "rollback failed");
    assert_eq!(
        restore.as_ref().map(ToString::to_string).as_deref(),
        Some("set_auto_commit failed")
    );
    assert!(err.to_string().contains("restoring auto-commit also failed"));
    assert!(!db.is_auto_commit());
    Ok(())
}

#[test]
fn restore_failure_after_successful_commit_is_reported() -> Result<(), Box<dyn std::error::Error>>
{
    let (mut db, _driver) = scripted(|s| s.fail_set_auto_commit_on = Some(true));
    db.connect()?;
    db.begin_transaction()?;

    let err = db.commit().unwrap_err();
    assert!(matches!(
        err,
        SqlAccessError::Transaction {
            source: DriverError::Other(_),
            restore: None
        }
    ));
    Ok(())
}

#[test]
fn rejected_mode_change_is_a_transaction_error() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, _driver) = scripted(|s| s.fail_set_auto_commit_on = Some(false));
    db.connect()?;
    assert!(matches!(
        db.begin_transaction(),
        Err(SqlAccessError::Transaction { .. })
    ));
    assert!(db.is_auto_commit());
    Ok(())
}

#[test]
fn close_failure_still_disconnects() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, driver) = scripted(|s| s.fail_close = true);
    db.connect()?;

    assert!(matches!(db.disconnect(), Err(SqlAccessError::Connection(_))));
    assert!(!db.is_connected());
    db.disconnect()?;
    assert_eq!(calls(&driver), ["open", "close"]);
    Ok(())
}

#[test]
fn open_failure_leaves_no_handle() {
    let (mut db, driver) = scripted(|s| s.fail_open = true);
    assert!(matches!(db.connect(), Err(SqlAccessError::Connection(_))));
    assert!(!db.is_connected());

    driver.0.borrow_mut().fail_open = false;
    db.connect().expect("second attempt connects");
    assert!(db.is_connected());
}

#[test]
fn connect_twice_opens_once() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, driver) = scripted(|_| {});
    db.connect()?;
    db.connect()?;
    assert_eq!(calls(&driver), ["open"]);
    Ok(())
}

#[test]
fn mismatch_never_reaches_the_driver() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, driver) = scripted(|_| {});
    db.connect()?;

    assert!(matches!(
        db.query("SELECT ? , ?", &params![1]),
        Err(SqlAccessError::ParameterMismatch {
            expected: 2,
            actual: 1
        })
    ));
    assert!(matches!(
        db.execute("UPDATE t SET a = ?", &[]),
        Err(SqlAccessError::ParameterMismatch {
            expected: 1,
            actual: 0
        })
    ));
    assert_eq!(calls(&driver), ["open"]);
    Ok(())
}

#[test]
fn parameters_are_passed_in_placeholder_order() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, _driver) = scripted(|_| {});
    db.connect()?;

    let rows = db.query("SELECT ?, ?, ?", &params!["a", 2, true])?;
    let echoed: Vec<&SqlValue> = rows.iter().filter_map(|r| r.get("echo")).collect();
    assert_eq!(
        echoed,
        [
            &SqlValue::Text("a".into()),
            &SqlValue::Int(2),
            &SqlValue::Bool(true)
        ]
    );
    assert_eq!(db.execute("DELETE FROM t WHERE a = ? OR b = ?", &params![1, 2])?, 2);
    Ok(())
}

#[test]
fn drop_rolls_back_then_closes() -> Result<(), Box<dyn std::error::Error>> {
    let (mut db, driver) = scripted(|_| {});
    db.connect()?;
    db.begin_transaction()?;
    drop(db);
    assert_eq!(
        calls(&driver),
        ["open", "set_auto_commit(false)", "rollback", "close"]
    );
    Ok(())
}

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use studycore_types::{Error, LogEntry, Result, Session, SessionId, Task};

/// Single-connection SQLite store guarded by a mutex, following the
/// corpus convention of one `Connection` per process rather than a pool.
/// Every collection is a table keyed by its natural id with the full
/// entity serialized as a JSON column; indexed columns exist only where
/// a query needs to filter or order without deserializing every row.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path).map_err(db_err)?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                session_id TEXT NOT NULL,
                task_id TEXT NOT NULL,
                task_order INTEGER NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (session_id, task_id)
            );

            CREATE TABLE IF NOT EXISTS devices (
                session_id TEXT NOT NULL,
                device_id TEXT NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (session_id, device_id)
            );

            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                timestamp_seconds INTEGER NOT NULL,
                data TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS explanations (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                task_id TEXT,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_session ON tasks(session_id, task_order);
            CREATE INDEX IF NOT EXISTS idx_devices_session ON devices(session_id);
            CREATE INDEX IF NOT EXISTS idx_logs_session ON logs(session_id, timestamp_seconds);
            CREATE INDEX IF NOT EXISTS idx_explanations_session ON explanations(session_id);
            "#,
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn put_session(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(session)?;
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO sessions (id, data) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET data = ?2
            "#,
            params![session.session_id.as_str(), data],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let data: Option<String> = conn
            .query_row("SELECT data FROM sessions WHERE id = ?1", [id.as_str()], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        data.map(|d| serde_json::from_str(&d).map_err(Error::from)).transpose()
    }

    /// Replaces the full task list for a session in one transaction,
    /// used at session creation to seed the (possibly shuffled) order.
    pub fn put_tasks(&self, session_id: &SessionId, tasks: &[Task]) -> Result<()> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute("DELETE FROM tasks WHERE session_id = ?1", [session_id.as_str()]).map_err(db_err)?;
        for task in tasks {
            let data = serde_json::to_string(task)?;
            tx.execute(
                "INSERT INTO tasks (session_id, task_id, task_order, data) VALUES (?1, ?2, ?3, ?4)",
                params![session_id.as_str(), task.task_id.as_str(), task.task_order as i64, data],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        Ok(())
    }

    pub fn get_tasks(&self, session_id: &SessionId) -> Result<Vec<Task>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT data FROM tasks WHERE session_id = ?1 ORDER BY task_order")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([session_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        let mut tasks = Vec::new();
        for row in rows {
            let data = row.map_err(db_err)?;
            tasks.push(serde_json::from_str(&data)?);
        }
        Ok(tasks)
    }

    /// Atomic per-document update: overwrites one task's row without
    /// touching the rest of the session's list.
    pub fn update_task(&self, session_id: &SessionId, task: &Task) -> Result<()> {
        let data = serde_json::to_string(task)?;
        let conn = self.conn.lock().expect("store mutex poisoned");
        let updated = conn
            .execute(
                "UPDATE tasks SET data = ?1, task_order = ?2 WHERE session_id = ?3 AND task_id = ?4",
                params![data, task.task_order as i64, session_id.as_str(), task.task_id.as_str()],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(Error::not_found(format!(
                "task '{}' not found in session '{}'",
                task.task_id, session_id
            )));
        }
        Ok(())
    }

    pub fn put_devices(&self, session_id: &SessionId, devices: &[studycore_types::Device]) -> Result<()> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction().map_err(db_err)?;
        tx.execute("DELETE FROM devices WHERE session_id = ?1", [session_id.as_str()]).map_err(db_err)?;
        for device in devices {
            let data = serde_json::to_string(device)?;
            tx.execute(
                "INSERT INTO devices (session_id, device_id, data) VALUES (?1, ?2, ?3)",
                params![session_id.as_str(), device.device_id.as_str(), data],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        Ok(())
    }

    pub fn get_devices(&self, session_id: &SessionId) -> Result<Vec<studycore_types::Device>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT data FROM devices WHERE session_id = ?1")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([session_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        let mut devices = Vec::new();
        for row in rows {
            let data = row.map_err(db_err)?;
            devices.push(serde_json::from_str(&data)?);
        }
        Ok(devices)
    }

    pub fn update_device(&self, session_id: &SessionId, device: &studycore_types::Device) -> Result<()> {
        let data = serde_json::to_string(device)?;
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO devices (session_id, device_id, data) VALUES (?1, ?2, ?3)
            ON CONFLICT(session_id, device_id) DO UPDATE SET data = ?3
            "#,
            params![session_id.as_str(), device.device_id.as_str(), data],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn append_log(&self, session_id: &SessionId, entry: &LogEntry) -> Result<i64> {
        let data = serde_json::to_string(entry)?;
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO logs (session_id, timestamp_seconds, data) VALUES (?1, ?2, ?3)",
            params![session_id.as_str(), entry.timestamp_seconds, data],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_logs(&self, session_id: &SessionId) -> Result<Vec<LogEntry>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT data FROM logs WHERE session_id = ?1 ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([session_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        let mut entries = Vec::new();
        for row in rows {
            let data = row.map_err(db_err)?;
            entries.push(serde_json::from_str(&data)?);
        }
        Ok(entries)
    }

    pub fn put_explanation(&self, session_id: &SessionId, explanation: &studycore_types::Explanation) -> Result<()> {
        let data = serde_json::to_string(explanation)?;
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO explanations (id, session_id, task_id, data) VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET data = ?4
            "#,
            params![
                explanation.explanation_id.to_string(),
                session_id.as_str(),
                explanation.task_id.as_str(),
                data
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn list_explanations(&self, session_id: &SessionId) -> Result<Vec<studycore_types::Explanation>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT data FROM explanations WHERE session_id = ?1")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([session_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        let mut out = Vec::new();
        for row in rows {
            let data = row.map_err(db_err)?;
            out.push(serde_json::from_str(&data)?);
        }
        Ok(out)
    }
}

fn db_err(e: rusqlite::Error) -> Error {
    Error::internal(format!("sqlite: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use studycore_types::{DeviceId, TaskId};

    fn sample_session() -> Session {
        Session::new(SessionId::from("s1"), Utc::now(), HashMap::new())
    }

    #[test]
    fn round_trips_a_session() {
        let store = Store::open_in_memory().unwrap();
        let session = sample_session();
        store.put_session(&session).unwrap();
        let fetched = store.get_session(&session.session_id).unwrap().unwrap();
        assert_eq!(fetched.session_id, session.session_id);
    }

    #[test]
    fn missing_session_is_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_session(&SessionId::from("missing")).unwrap().is_none());
    }

    #[test]
    fn open_creates_parent_directories_and_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("study.db");

        {
            let store = Store::open(&db_path).unwrap();
            store.put_session(&sample_session()).unwrap();
        }

        let store = Store::open(&db_path).unwrap();
        assert!(store.get_session(&SessionId::from("s1")).unwrap().is_some());
    }

    #[test]
    fn updating_unknown_task_fails() {
        let store = Store::open_in_memory().unwrap();
        let session_id = SessionId::from("s1");
        let task = studycore_types::Task {
            task_id: TaskId::from("t1"),
            task_order: 0,
            description: String::new(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            is_completed: false,
            is_aborted: false,
            is_timed_out: false,
            completion_time: None,
            aborted_reason: None,
            duration: None,
            interaction_times: 0,
        };
        let err = store.update_task(&session_id, &task).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn update_task_overwrites_only_the_named_task() {
        let store = Store::open_in_memory().unwrap();
        let session_id = SessionId::from("s1");
        let make_task = |id: &str, order: i64| studycore_types::Task {
            task_id: TaskId::from(id),
            task_order: order,
            description: String::new(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            is_completed: false,
            is_aborted: false,
            is_timed_out: false,
            completion_time: None,
            aborted_reason: None,
            duration: None,
            interaction_times: 0,
        };
        store.put_tasks(&session_id, &[make_task("t1", 0), make_task("t2", 1)]).unwrap();

        let mut completed = make_task("t1", 0);
        completed.is_completed = true;
        store.update_task(&session_id, &completed).unwrap();

        let tasks = store.get_tasks(&session_id).unwrap();
        assert!(tasks.iter().find(|t| t.task_id == TaskId::from("t1")).unwrap().is_completed);
        assert!(!tasks.iter().find(|t| t.task_id == TaskId::from("t2")).unwrap().is_completed);
    }

    #[test]
    fn update_device_upserts_without_touching_other_devices() {
        let store = Store::open_in_memory().unwrap();
        let session_id = SessionId::from("s1");
        let mut light = studycore_types::Device::new("light".into());
        light.set("power".into(), studycore_types::InteractionType::Boolean, studycore_types::Value::Bool(false));
        let lamp = studycore_types::Device::new("lamp".into());
        store.put_devices(&session_id, &[light.clone(), lamp.clone()]).unwrap();

        light.set("power".into(), studycore_types::InteractionType::Boolean, studycore_types::Value::Bool(true));
        store.update_device(&session_id, &light).unwrap();

        let devices = store.get_devices(&session_id).unwrap();
        assert_eq!(devices.len(), 2);
        let stored_light = devices.iter().find(|d| d.device_id == DeviceId::from("light")).unwrap();
        assert_eq!(stored_light.get(&"power".into()), Some(&studycore_types::Value::Bool(true)));
    }

    #[test]
    fn logs_preserve_insertion_order() {
        let store = Store::open_in_memory().unwrap();
        let session_id = SessionId::from("s1");
        for i in 0..3 {
            let entry = LogEntry::new(
                studycore_types::LogEntryKind::TaskBegin,
                serde_json::json!({ "i": i }),
                i,
                session_id.clone(),
            );
            store.append_log(&session_id, &entry).unwrap();
        }
        let logs = store.list_logs(&session_id).unwrap();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].timestamp_seconds, 0);
        assert_eq!(logs[2].timestamp_seconds, 2);
    }
}

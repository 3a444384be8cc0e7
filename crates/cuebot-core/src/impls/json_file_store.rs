//! JsonFileStore - JSON ファイルに永続化するグローバル変数ストア
//!
//! CLI の実行をまたいでキュー・履歴・再生時間を残すために使います。
//!
//! # 排他制御
//! - `cuebot` の各実行は別プロセスなので、メモリ上にキャッシュは持たない
//! - 操作ごとに `<path>.lock` の OS ロック（fd-lock）を取り、ロック内でファイルを読み直す
//! - 書き込みは一時ファイル → rename。書き込みに失敗した変更はどこにも残らない

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::ports::{KeyValueStore, StoreError};

type Globals = BTreeMap<String, Value>;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    ///
    /// The file is read once here so a malformed globals file fails fast.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = read_shared(&path)?;
        debug!(path = %path.display(), keys = values.len(), "opened globals file");
        Ok(Self { path })
    }

    /// Run `task` against the file on the blocking pool.
    async fn blocking<T, F>(&self, task: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        // spawn_blocking で同期 I/O とロック待ちを実行
        tokio::task::spawn_blocking(move || task(&path))
            .await
            .map_err(|e| StoreError::Write(format!("store task failed: {e}")))?
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn open_lock(path: &Path) -> Result<RwLock<File>, StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::Write(e.to_string()))?;
    }
    let lock_path = sidecar(path, ".lock");
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| StoreError::Write(format!("{}: {e}", lock_path.display())))?;
    Ok(RwLock::new(file))
}

fn lock_failed(path: &Path, e: io::Error) -> StoreError {
    StoreError::Read(format!("lock {}: {e}", path.display()))
}

fn load(path: &Path) -> Result<Globals, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Globals::new()),
        Err(e) => return Err(StoreError::Read(format!("{}: {e}", path.display()))),
    };
    if contents.trim().is_empty() {
        return Ok(Globals::new());
    }
    serde_json::from_str(&contents).map_err(|e| StoreError::Malformed {
        key: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Current contents under a shared lock.
fn read_shared(path: &Path) -> Result<Globals, StoreError> {
    let lock = open_lock(path)?;
    let _guard = lock.read().map_err(|e| lock_failed(path, e))?;
    load(path)
}

/// Read, change and write back under an exclusive lock.
///
/// `change` edits a freshly loaded copy and says whether to write it.
fn update<T>(path: &Path, change: impl FnOnce(&mut Globals) -> (T, bool)) -> Result<T, StoreError> {
    let mut lock = open_lock(path)?;
    let _guard = lock.write().map_err(|e| lock_failed(path, e))?;
    let mut values = load(path)?;
    let (out, changed) = change(&mut values);
    if changed {
        write_atomically(path, &values)?;
    }
    Ok(out)
}

fn write_atomically(path: &Path, values: &Globals) -> Result<(), StoreError> {
    let contents =
        serde_json::to_string_pretty(values).map_err(|e| StoreError::Write(e.to_string()))?;
    let tmp = sidecar(path, ".tmp");
    fs::write(&tmp, contents).map_err(|e| StoreError::Write(format!("{}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| StoreError::Write(format!("{}: {e}", path.display())))
}

#[async_trait::async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let key = key.to_string();
        self.blocking(move |path| Ok(read_shared(path)?.remove(&key)))
            .await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let key = key.to_string();
        self.blocking(move |path| {
            update(path, |values| {
                values.insert(key, value);
                ((), true)
            })
        })
        .await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<Value>,
        new: Value,
    ) -> Result<bool, StoreError> {
        let key = key.to_string();
        self.blocking(move |path| {
            update(path, |values| {
                if values.get(&key) != expected.as_ref() {
                    return (false, false);
                }
                values.insert(key, new);
                (true, true)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FLAG: &str = "DMFL_STATUS_NOW_PLAYING";

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("globals.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set("DMFL_CURRENT_QUEUE", json!([])).await.unwrap();
        assert!(store.compare_and_set(FLAG, None, json!(true)).await.unwrap());
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("DMFL_CURRENT_QUEUE").await.unwrap(), Some(json!([])));
        assert_eq!(reopened.get(FLAG).await.unwrap(), Some(json!(true)));
    }

    #[test]
    fn malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globals.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn handles_on_one_file_share_the_busy_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globals.json");
        let a = JsonFileStore::open(&path).unwrap();
        let b = JsonFileStore::open(&path).unwrap();

        assert!(a.compare_and_set(FLAG, None, json!(true)).await.unwrap());
        assert!(!b.compare_and_set(FLAG, None, json!(true)).await.unwrap());

        a.set("DMFL_LASTPLAYED_QUEUE", json!(["a"])).await.unwrap();
        b.set("DMFL_CURRENT_QUEUE", json!(["b"])).await.unwrap();
        assert_eq!(b.get("DMFL_LASTPLAYED_QUEUE").await.unwrap(), Some(json!(["a"])));
        assert_eq!(a.get("DMFL_CURRENT_QUEUE").await.unwrap(), Some(json!(["b"])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_handles_have_one_flag_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globals.json");

        let attempts: Vec<_> = (0..8)
            .map(|i| {
                let store = JsonFileStore::open(&path).unwrap();
                tokio::spawn(async move {
                    let won = store.compare_and_set(FLAG, None, json!(true)).await.unwrap();
                    store.set(&format!("seen_{i}"), json!(i)).await.unwrap();
                    won
                })
            })
            .collect();
        let mut winners = 0;
        for attempt in attempts {
            if attempt.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        let store = JsonFileStore::open(&path).unwrap();
        for i in 0..8 {
            assert_eq!(store.get(&format!("seen_{i}")).await.unwrap(), Some(json!(i)));
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_values_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globals.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("DMFL_CURRENT_QUEUE", json!([])).await.unwrap();

        // A directory where the temp file goes makes every write fail.
        let tmp = sidecar(&path, ".tmp");
        fs::create_dir(&tmp).unwrap();
        assert!(store.set("DMFL_CURRENT_QUEUE", json!(["x"])).await.is_err());
        assert!(store.compare_and_set(FLAG, None, json!(true)).await.is_err());

        assert_eq!(store.get("DMFL_CURRENT_QUEUE").await.unwrap(), Some(json!([])));
        assert_eq!(store.get(FLAG).await.unwrap(), None);

        fs::remove_dir(&tmp).unwrap();
        assert!(store.compare_and_set(FLAG, None, json!(true)).await.unwrap());
    }
}

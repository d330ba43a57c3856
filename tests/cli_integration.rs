#[allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        Self { dir }
    }

    fn workspace_dir(&self) -> PathBuf {
        self.dir.path().join(".taskdeck")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskdeck").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("TASKDECK_HOME")
            .env_remove("TASKDECK_PROJECT_ID")
            .env_remove("TASKDECK_TASK_PAGE_SIZE")
            .env_remove("TASKDECK_CATEGORY_PAGE_SIZE")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run_json_with(&self, args: &[&str], envs: &[(&str, &str)]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self
            .cmd()
            .envs(envs.iter().copied())
            .args(&a)
            .output()
            .expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_json(&self, args: &[&str]) -> Value {
        self.run_json_with(args, &[])
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    fn add_task(&self, args: &[&str]) -> String {
        let mut a = vec!["task", "add"];
        a.extend_from_slice(args);
        let v = self.run_ok(&a);
        v["data"]["task"]["id"].as_str().unwrap().to_string()
    }
}

fn signed_in_env() -> TestEnv {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.run_ok(&["login", "--email", "ada@example.com", "--first-name", "Ada"]);
    env
}

fn category_count(status: &Value, name: &str) -> u64 {
    status["data"]["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .unwrap_or_else(|| panic!("no category {name}: {status}"))["task_count"]
        .as_u64()
        .unwrap()
}

// ─── 1. init ───────────────────────────────────────────────────────

#[test]
fn test_init() {
    let env = TestEnv::new();
    let v = env.run_ok(&["init"]);
    let db = v["data"]["database"].as_str().unwrap();
    assert!(db.ends_with(".taskdeck/taskdeck.db"));
    assert!(PathBuf::from(db).exists());
    assert!(env.workspace_dir().join("config.json").exists());
}

#[test]
fn test_init_idempotent() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.run_ok(&["init"]);
    assert!(v["data"]["database"].as_str().unwrap().contains("taskdeck.db"));
}

#[test]
fn test_init_required_before_commands() {
    let env = TestEnv::new();
    let v = env.run_err(&["task", "list"]);
    assert_eq!(v["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn test_workspace_found_from_subdirectory() {
    let env = signed_in_env();
    let nested = env.dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    let output = env
        .cmd()
        .current_dir(&nested)
        .args(["whoami", "--json"])
        .output()
        .expect("run");
    let v: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["data"]["user"]["email"], "ada@example.com");
}

#[test]
fn test_home_env_overrides_lookup() {
    let env = TestEnv::new();
    let home = env.dir.path().join("elsewhere");
    let home_str = home.to_str().unwrap();
    let v = env.run_json_with(&["init"], &[("TASKDECK_HOME", home_str)]);
    assert_eq!(v["success"], true);
    assert!(home.join("taskdeck.db").exists());
    assert!(!env.workspace_dir().exists());
}

// ─── 2. auth ───────────────────────────────────────────────────────

#[test]
fn test_commands_require_sign_in() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.run_err(&["task", "list"]);
    assert_eq!(v["error"]["code"], "NOT_AUTHENTICATED");
    let v = env.run_err(&["whoami"]);
    assert_eq!(v["error"]["code"], "NOT_AUTHENTICATED");
}

#[test]
fn test_login_whoami_logout() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);

    let v = env.run_ok(&[
        "login", "--email", "ada@example.com", "--first-name", "Ada", "--last-name", "Lovelace",
    ]);
    assert_eq!(v["data"]["user"]["display_name"], "Ada Lovelace");
    assert_eq!(v["data"]["navigate_to"], "/");

    let v = env.run_ok(&["whoami"]);
    assert_eq!(v["data"]["user"]["email"], "ada@example.com");
    assert_eq!(v["data"]["state"], "authenticated");

    let v = env.run_ok(&["logout", "--location", "/tasks"]);
    assert_eq!(v["data"]["navigate_to"], "/login");

    let v = env.run_err(&["whoami"]);
    assert_eq!(v["error"]["code"], "NOT_AUTHENTICATED");
    let v = env.run_err(&["logout"]);
    assert_eq!(v["error"]["code"], "NOT_AUTHENTICATED");
}

#[test]
fn test_login_follows_redirect() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.run_ok(&[
        "login", "--email", "ada@example.com", "--location", "/login?redirect=/reports",
    ]);
    assert_eq!(v["data"]["navigate_to"], "/reports");

    let v = env.run_ok(&["whoami", "--location", "/callback"]);
    assert_eq!(v["data"]["navigate_to"], "/");
}

#[test]
fn test_login_rejects_bad_email() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let v = env.run_err(&["login", "--email", "not-an-email"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_corrupt_session_fails_sign_in() {
    let env = signed_in_env();
    fs::write(env.workspace_dir().join("session.json"), "{not json").unwrap();
    let v = env.run_err(&["task", "list"]);
    assert_eq!(v["error"]["code"], "NOT_AUTHENTICATED");
    assert!(v["error"]["message"].as_str().unwrap().starts_with("Sign-in failed"));

    env.run_ok(&["logout"]);
    assert!(!env.workspace_dir().join("session.json").exists());
}

// ─── 3. tasks ──────────────────────────────────────────────────────

#[test]
fn test_buy_milk_flow() {
    let env = signed_in_env();

    let v = env.run_ok(&[
        "task", "add", "Buy milk", "--category", "Shopping", "--priority", "high", "--due", "2030-01-15",
    ]);
    let task = &v["data"]["task"];
    let id = task["id"].as_str().unwrap().to_string();
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["category_id"], "default-3");
    assert_eq!(task["due_date"], "2030-01-15");
    assert_eq!(task["is_completed"], false);
    assert_eq!(v["notifications"][0]["level"], "success");
    assert_eq!(v["notifications"][0]["message"], "Task created successfully!");

    let v = env.run_ok(&["status"]);
    assert_eq!(category_count(&v, "Shopping"), 1);
    assert_eq!(v["data"]["stats"]["pending"], 1);

    let v = env.run_ok(&["task", "toggle", &id]);
    assert_eq!(v["data"]["task"]["is_completed"], true);
    assert_eq!(v["notifications"][0]["message"], "Task completed!");

    let v = env.run_ok(&["status"]);
    assert_eq!(category_count(&v, "Shopping"), 0);
    assert_eq!(v["data"]["stats"]["completion_percent"], 100);

    let v = env.run_ok(&["task", "list", "--filter", "pending"]);
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 0);
    let v = env.run_ok(&["task", "list", "--filter", "completed"]);
    assert_eq!(v["data"]["tasks"][0]["id"], id.as_str());
}

#[test]
fn test_add_defaults_and_coercion() {
    let env = signed_in_env();
    let v = env.run_ok(&["task", "add", "  Call mom  ", "--priority", "urgent"]);
    let task = &v["data"]["task"];
    assert_eq!(task["title"], "Call mom");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["description"], "");
    assert!(task["due_date"].is_null());
    assert!(task["category_id"].is_null());
}

#[test]
fn test_add_blank_title_is_rejected() {
    let env = signed_in_env();
    let v = env.run_err(&["task", "add", "   "]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(v["error"]["message"], "Please enter a task title");
    let v = env.run_ok(&["task", "list"]);
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_add_bad_due_date() {
    let env = signed_in_env();
    let v = env.run_err(&["task", "add", "X", "--due", "tomorrow"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_list_newest_first_and_by_category() {
    let env = signed_in_env();
    env.add_task(&["first", "--category", "Work"]);
    env.add_task(&["second", "--category", "Health"]);
    env.add_task(&["third", "--category", "Work"]);

    let v = env.run_ok(&["task", "list"]);
    let titles: Vec<_> = v["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["third", "second", "first"]);

    let v = env.run_ok(&["task", "list", "--category", "work"]);
    assert_eq!(v["data"]["category"], "default-2");
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 2);
}

#[test]
fn test_list_unknown_filter() {
    let env = signed_in_env();
    let v = env.run_err(&["task", "list", "--filter", "someday"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_list_overdue_and_today() {
    let env = signed_in_env();
    env.add_task(&["Past", "--due", "2000-01-01"]);
    env.add_task(&["Future", "--due", "2999-01-01"]);
    let v = env.run_ok(&["task", "list", "--filter", "overdue"]);
    let tasks = v["data"]["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Past");
    let v = env.run_ok(&["task", "list", "--filter", "today"]);
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_show_by_prefix() {
    let env = signed_in_env();
    let id = env.add_task(&["Buy milk", "--description", "2 litres", "--category", "Shopping"]);
    let v = env.run_ok(&["task", "show", &id[..id.len() - 2]]);
    assert_eq!(v["data"]["task"]["id"], id.as_str());
    assert_eq!(v["data"]["task"]["description"], "2 litres");
    assert_eq!(v["data"]["category"]["name"], "Shopping");
}

#[test]
fn test_show_unknown_task() {
    let env = signed_in_env();
    let v = env.run_err(&["task", "show", "ZZZZ"]);
    assert_eq!(v["error"]["code"], "TASK_NOT_FOUND");
}

#[test]
fn test_edit_changes_only_given_fields() {
    let env = signed_in_env();
    let id = env.add_task(&[
        "Buy milk", "--description", "2 litres", "--due", "2030-01-15", "--category", "Shopping",
    ]);

    let v = env.run_ok(&["task", "edit", &id, "--title", "Buy oat milk", "--due", ""]);
    let task = &v["data"]["task"];
    assert_eq!(task["title"], "Buy oat milk");
    assert_eq!(task["description"], "2 litres");
    assert!(task["due_date"].is_null());
    assert_eq!(task["category_id"], "default-3");
    assert_eq!(v["notifications"][0]["message"], "Task updated successfully!");

    let v = env.run_ok(&["task", "edit", &id, "--category", "", "--priority", "low"]);
    assert!(v["data"]["task"]["category_id"].is_null());
    assert_eq!(v["data"]["task"]["priority"], "low");

    let v = env.run_ok(&["task", "show", &id]);
    assert_eq!(v["data"]["task"]["title"], "Buy oat milk");
    assert_eq!(v["data"]["task"]["priority"], "low");
}

#[test]
fn test_edit_blank_title_is_rejected() {
    let env = signed_in_env();
    let id = env.add_task(&["Buy milk"]);
    let v = env.run_err(&["task", "edit", &id, "--title", " "]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_ok(&["task", "show", &id]);
    assert_eq!(v["data"]["task"]["title"], "Buy milk");
}

#[test]
fn test_toggle_back_to_pending() {
    let env = signed_in_env();
    let id = env.add_task(&["Buy milk"]);
    env.run_ok(&["task", "toggle", &id]);
    let v = env.run_ok(&["task", "toggle", &id]);
    assert_eq!(v["data"]["task"]["is_completed"], false);
    assert_eq!(v["notifications"][0]["message"], "Task marked as pending");
}

#[test]
fn test_delete_task() {
    let env = signed_in_env();
    let id = env.add_task(&["Buy milk", "--category", "Shopping"]);
    let v = env.run_ok(&["task", "delete", &id]);
    assert_eq!(v["data"]["deleted"]["title"], "Buy milk");
    assert_eq!(v["notifications"][0]["message"], "Task deleted successfully");

    let v = env.run_err(&["task", "show", &id]);
    assert_eq!(v["error"]["code"], "TASK_NOT_FOUND");
    let v = env.run_ok(&["status"]);
    assert_eq!(category_count(&v, "Shopping"), 0);
}

#[test]
fn test_search_title_or_description() {
    let env = signed_in_env();
    env.add_task(&["Buy milk"]);
    env.add_task(&["Groceries", "--description", "oat MILK"]);
    env.add_task(&["Call mom"]);
    let v = env.run_ok(&["task", "search", "milk"]);
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 2);
}

#[test]
fn test_text_output() {
    let env = signed_in_env();
    env.cmd()
        .args(["task", "add", "Buy milk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task created successfully!"))
        .stdout(predicate::str::contains("Added task: Buy milk"));

    env.cmd()
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ] Buy milk"));

    env.cmd()
        .args(["task", "add", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Please enter a task title"));
}

// ─── 4. categories ─────────────────────────────────────────────────

#[test]
fn test_default_categories() {
    let env = signed_in_env();
    let v = env.run_ok(&["category", "list"]);
    let names: Vec<_> = v["data"]["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Personal", "Work", "Shopping", "Health"]);
    assert_eq!(v["data"]["categories"][0]["color"], "#3b82f6");
}

#[test]
fn test_category_crud() {
    let env = signed_in_env();
    let v = env.run_ok(&["category", "add", "Errands", "--color", "#ef4444"]);
    let id = v["data"]["category"]["id"].as_str().unwrap().to_string();
    assert_eq!(v["data"]["category"]["color"], "#ef4444");

    env.run_ok(&["category", "add", "Books"]);
    let v = env.run_ok(&["category", "list"]);
    let categories = v["data"]["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0]["name"], "Books");
    assert_eq!(categories[0]["color"], "#6366f1");

    let task = env.add_task(&["Post office", "--category", "errands"]);
    let v = env.run_ok(&["category", "list"]);
    assert_eq!(v["data"]["categories"][1]["task_count"], 1);

    env.run_ok(&["category", "delete", &id]);
    let v = env.run_ok(&["task", "show", &task]);
    assert_eq!(v["data"]["task"]["category_id"], id.as_str());
    assert!(v["data"]["category"].is_null());
}

#[test]
fn test_category_validation() {
    let env = signed_in_env();
    let v = env.run_err(&["category", "add", "Errands", "--color", "red"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["category", "add", "  "]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    let v = env.run_err(&["task", "add", "X", "--category", "Nope"]);
    assert_eq!(v["error"]["code"], "CATEGORY_NOT_FOUND");
}

#[test]
fn test_category_load_failure_is_reported() {
    let env = signed_in_env();
    let conn = rusqlite::Connection::open(env.workspace_dir().join("taskdeck.db")).unwrap();
    conn.execute(
        "INSERT INTO records (project, collection, id, data, created_on, modified_on)
         VALUES ('default', 'categories', 'broken', '[1]',
                 '2026-01-01T00:00:00.000Z', '2026-01-01T00:00:00.000Z')",
        [],
    )
    .unwrap();
    drop(conn);

    let v = env.run_ok(&["category", "list"]);
    assert_eq!(v["data"]["state"], "load_failed");
    assert_eq!(v["data"]["categories"].as_array().unwrap().len(), 4);
    let notifications = v["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["level"], "error");
    assert_eq!(
        notifications[0]["message"],
        "Failed to load categories. Using default categories."
    );

    let v = env.run_ok(&["task", "list"]);
    assert_eq!(v["notifications"][0]["level"], "error");

    env.cmd()
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal"))
        .stderr(predicate::str::contains(
            "Error: Failed to load categories. Using default categories.",
        ));
}

// ─── 5. configuration ──────────────────────────────────────────────

#[test]
fn test_projects_are_isolated() {
    let env = signed_in_env();
    env.add_task(&["Buy milk"]);
    let v = env.run_json_with(&["task", "list"], &[("TASKDECK_PROJECT_ID", "other")]);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 0);
}

#[test]
fn test_page_size_from_config_file() {
    let env = signed_in_env();
    for title in ["a", "b", "c"] {
        env.add_task(&[title]);
    }
    fs::write(
        env.workspace_dir().join("config.json"),
        r#"{"task_page_size": 2}"#,
    )
    .unwrap();
    let v = env.run_ok(&["status"]);
    assert_eq!(v["data"]["stats"]["total"], 2);
}

#[test]
fn test_invalid_page_size_env() {
    let env = signed_in_env();
    let v = env.run_json_with(&["task", "list"], &[("TASKDECK_TASK_PAGE_SIZE", "0")]);
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "CONFIG_ERROR");
}

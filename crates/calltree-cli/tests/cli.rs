use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

const ROSTER: &str = "Name,Number,Department,Location,Position,Level\n\
Ana Reyes,09170000001,HR,Makati,Clerk,L1\n\
Ben Cruz,09170000002,IT,Pasig,Engineer,L2\n\
Cai Lim,09170000003,IT,Pasig,Analyst,L2\n\
Dee Santos,0917 000 0004,Ops,\"Quezon City\",Driver,\n\
,09170000005,Ops,,,\n";

fn exec(db_path: &Path, json: bool, args: &[&str]) -> Output {
    let config_home = db_path.parent().expect("db dir").join("config");
    let mut cmd = cargo_bin_cmd!("calltree");
    cmd.env("XDG_CONFIG_HOME", &config_home)
        .args(["--db-path", db_path.to_str().expect("db path")]);
    if json {
        cmd.arg("--json");
    }
    cmd.args(args).output().expect("run command")
}

fn run_cmd(db_path: &Path, args: &[&str]) -> String {
    let output = exec(db_path, false, args);
    assert!(output.status.success(), "command failed: {:?}", output);
    String::from_utf8(output.stdout).expect("utf8")
}

fn run_cmd_json(db_path: &Path, args: &[&str]) -> Value {
    let output = exec(db_path, true, args);
    assert!(output.status.success(), "command failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("parse json")
}

fn run_cmd_code(db_path: &Path, args: &[&str]) -> i32 {
    let output = exec(db_path, false, args);
    assert!(!output.status.success(), "command unexpectedly passed");
    output.status.code().expect("exit code")
}

fn import_roster(temp: &TempDir, db_path: &Path) {
    let roster = temp.path().join("roster.csv");
    fs::write(&roster, ROSTER).expect("write roster");
    let report = run_cmd_json(db_path, &["import", "roster", roster.to_str().expect("path")]);
    assert_eq!(report["created"], 4);
    assert_eq!(report["skipped"], 1);
}

fn contact_id(db_path: &Path, name: &str) -> String {
    let contacts = run_cmd_json(db_path, &["contact", "ls"]);
    contacts
        .as_array()
        .expect("array")
        .iter()
        .find(|contact| contact["name"] == name)
        .and_then(|contact| contact["id"].as_str())
        .expect("contact id")
        .to_string()
}

#[test]
fn roster_import_dry_run_writes_nothing() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("calltree.sqlite3");
    let roster = temp.path().join("roster.csv");
    fs::write(&roster, ROSTER).expect("write roster");

    let report = run_cmd_json(
        &db_path,
        &["import", "roster", roster.to_str().expect("path"), "--dry-run"],
    );
    assert_eq!(report["created"], 4);
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["warnings"].as_array().expect("warnings").len(), 1);

    let contacts = run_cmd_json(&db_path, &["contact", "ls"]);
    assert!(contacts.as_array().expect("array").is_empty());

    // Same file again updates instead of duplicating.
    import_roster(&temp, &db_path);
    let report = run_cmd_json(&db_path, &["import", "roster", roster.to_str().expect("path")]);
    assert_eq!(report["created"], 0);
    assert_eq!(report["updated"], 4);
}

#[test]
fn incident_response_dashboard_flow() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("calltree.sqlite3");
    import_roster(&temp, &db_path);

    assert_eq!(run_cmd_code(&db_path, &["dashboard"]), 2);

    let incident = run_cmd_json(&db_path, &["incident", "start", "Quake drill", "--kind", "test"]);
    assert_eq!(incident["active"], true);
    assert_eq!(incident["kind"], "test");
    let incident_id = incident["id"].as_i64().expect("incident id").to_string();
    assert_eq!(run_cmd_code(&db_path, &["incident", "start", "Second"]), 3);

    let severe = run_cmd_json(
        &db_path,
        &[
            "response", "add", "--from", "09170000002", "--text", "4 trapped", "--uid", "gw-1",
        ],
    );
    assert_eq!(severe["status"], "Severe");
    assert_eq!(severe["contact_name"], "Ben Cruz");
    assert_eq!(severe["match_kind"], "phone");
    assert_eq!(
        run_cmd_code(
            &db_path,
            &["response", "add", "--from", "09170000002", "--text", "4", "--uid", "gw-1"],
        ),
        3
    );

    run_cmd(&db_path, &["response", "add", "--from", "09170000001", "--text", "safe"]);
    let by_name = run_cmd_json(
        &db_path,
        &["response", "add", "--from", "09990000000", "--text", "2 Cai Lim"],
    );
    assert_eq!(by_name["contact_name"], "Cai Lim");
    assert_eq!(by_name["match_kind"], "name");
    run_cmd(&db_path, &["response", "add", "--from", "08880000000", "--text", "hello"]);

    let listed = run_cmd_json(&db_path, &["response", "ls"]);
    assert_eq!(listed.as_array().expect("array").len(), 4);

    let everyone = run_cmd_json(&db_path, &["dashboard", "--all"]);
    assert_eq!(everyone["stats"]["total"], 4);
    assert_eq!(everyone["stats"]["responded"], 3);
    assert_eq!(everyone["stats"]["severe"], 1);
    assert_eq!(everyone["stats"]["pending"], 1);
    assert_eq!(everyone["percentages"]["response_rate"], 75);
    assert_eq!(everyone["pending"][0]["name"], "Dee Santos");
    assert_eq!(everyone["unknown"].as_array().expect("unknown").len(), 1);

    // Default selection: only departments that already have replies.
    let defaults = run_cmd_json(&db_path, &["dashboard"]);
    assert_eq!(defaults["filter"]["departments"], serde_json::json!(["HR", "IT"]));
    assert_eq!(defaults["stats"]["total"], 3);

    let affected = run_cmd_json(&db_path, &["dashboard", "--all", "--is", "affected"]);
    assert_eq!(affected["stats"]["total"], 2);

    let text = run_cmd(&db_path, &["dashboard", "--all"]);
    assert!(text.contains("Quake drill"));
    assert!(text.contains("Pending (1)"));

    let dee = contact_id(&db_path, "Dee Santos");
    let manual = run_cmd_json(
        &db_path,
        &["response", "manual", &dee, "--status", "moderate", "--message", "roof"],
    );
    assert_eq!(manual["contact_name"], "Dee Santos");
    assert_eq!(manual["match_kind"], "manual");
    assert_eq!(manual["contents"], "3 - roof");

    let after = run_cmd_json(&db_path, &["dashboard", "--all"]);
    assert_eq!(after["stats"]["pending"], 0);
    assert_eq!(after["stats"]["moderate"], 1);

    let ended = run_cmd_json(&db_path, &["incident", "end"]);
    assert_eq!(ended["active"], false);
    assert_eq!(run_cmd_json(&db_path, &["incident", "status"]), Value::Null);
    let history = run_cmd_json(&db_path, &["incident", "history"]);
    assert_eq!(history.as_array().expect("history").len(), 1);

    let past = run_cmd_json(&db_path, &["dashboard", "--incident", &incident_id, "--all"]);
    assert_eq!(past["stats"]["responded"], 4);
    assert_eq!(run_cmd_code(&db_path, &["dashboard"]), 2);
}

#[test]
fn exports_follow_dashboard_selection() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("calltree.sqlite3");
    import_roster(&temp, &db_path);
    run_cmd(&db_path, &["incident", "start", "Flood"]);
    run_cmd(&db_path, &["response", "add", "--from", "09170000001", "--text", "1"]);
    run_cmd(&db_path, &["response", "add", "--from", "08880000000", "--text", "who, me?"]);

    let out = temp.path().join("exports").join("responses.csv");
    let report = run_cmd_json(
        &db_path,
        &["export", "responses", "--all", "--out", out.to_str().expect("path")],
    );
    assert_eq!(report["rows"], 1);
    let csv = fs::read_to_string(&out).expect("read export");
    assert!(csv.starts_with("name,status,position,department,location,datetime,number\r\n"));
    assert!(csv.contains("Ana Reyes,Safe,Clerk,HR,Makati,"));

    let pending = run_cmd(&db_path, &["export", "pending", "--all", "--sort", "name"]);
    let lines: Vec<&str> = pending.lines().collect();
    assert_eq!(lines[0], "Name,Dept,Position,Phone");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("Ben Cruz,"));

    let unknown = run_cmd(&db_path, &["export", "unknown"]);
    assert!(unknown.contains("08880000000,\"who, me?\""));

    assert_eq!(run_cmd_code(&db_path, &["--json", "export", "unknown"]), 3);
}

#[test]
fn watch_refreshes_until_limit() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("calltree.sqlite3");
    import_roster(&temp, &db_path);
    run_cmd(&db_path, &["incident", "start", "Drill", "--kind", "drill"]);

    let output = exec(
        &db_path,
        true,
        &["dashboard", "--watch", "--interval", "1", "--max-refreshes", "2"],
    );
    assert!(output.status.success(), "command failed: {:?}", output);
    let documents: Vec<Value> = serde_json::Deserializer::from_slice(&output.stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("json stream");
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[1]["stats"]["total"], 4);

    assert_eq!(
        run_cmd_code(&db_path, &["dashboard", "--watch", "--interval", "0"]),
        3
    );
}

#[test]
fn contact_edit_show_and_delete() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("calltree.sqlite3");

    let created = run_cmd_json(
        &db_path,
        &[
            "contact", "add", "--name", "Eve Tan", "--number", "0917-555-0000", "--department",
            "Finance",
        ],
    );
    let id = created["id"].as_str().expect("id").to_string();

    let updated = run_cmd_json(&db_path, &["contact", "edit", &id, "--level", "L3"]);
    assert_eq!(updated["level"], "L3");
    assert_eq!(run_cmd_code(&db_path, &["contact", "edit", &id]), 3);

    let detail = run_cmd_json(&db_path, &["contact", "show", &id]);
    assert_eq!(detail["normalized_number"], "09175550000");
    assert_eq!(detail["department"], "Finance");

    run_cmd(&db_path, &["contact", "rm", &id]);
    assert_eq!(run_cmd_code(&db_path, &["contact", "show", &id]), 2);
    assert_eq!(run_cmd_code(&db_path, &["contact", "show", "nope"]), 3);
}

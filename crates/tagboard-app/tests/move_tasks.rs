//! Integration tests for moving tasks between lists.
//!
//! Each test loads a small board from a [`MemoryStore`] and checks list
//! membership, ranks, and the exact file text written back.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;

use tagboard_app::{
    AddTask, BoardError, CardsConfig, ListConfig, MemoryStore, MoveRequest, ProjectConfig,
    Repository,
};
use tagboard_core::{ORDER_KEY, TaskId};

const BOARD: &str = "# Board
- [ ] #TODO write spec order:0
- [ ] #TODO draft api order:10
- [ ] #TODO review order:20
- [ ] #DOING code parser
- [ ] #DOING code store
- [x] #DONE setup repo
";

const SOURCE: &str = "// TODO: handle unicode
fn main() {}
// FIXME: leak in cache
";

fn store() -> MemoryStore {
    MemoryStore::new()
        .with_file("TODO.md", BOARD)
        .with_file("src/lib.rs", SOURCE)
}

fn config(order_meta: bool) -> ProjectConfig {
    ProjectConfig::default()
        .with_lists(vec![
            ListConfig::concrete("TODO"),
            ListConfig::concrete("DOING"),
            ListConfig::concrete("DONE"),
            ListConfig::virtual_list("URGENT", "+urgent"),
        ])
        .with_cards(CardsConfig {
            order_meta,
            ..CardsConfig::default()
        })
}

fn open(store: &MemoryStore, order_meta: bool) -> Repository<MemoryStore> {
    Repository::open(store.clone(), config(order_meta)).expect("open board")
}

fn id(repo: &Repository<MemoryStore>, text: &str) -> TaskId {
    repo.tasks()
        .find(|task| task.text == text)
        .map(|task| task.id)
        .expect("task exists")
}

fn ids(repo: &Repository<MemoryStore>, list: &str) -> Vec<TaskId> {
    repo.tasks_in_list(list)
        .into_iter()
        .map(|task| task.id)
        .collect()
}

fn without(ids: &[TaskId], moved: TaskId) -> Vec<TaskId> {
    ids.iter().copied().filter(|id| *id != moved).collect()
}

fn tasks_per_file(repo: &Repository<MemoryStore>) -> BTreeMap<String, usize> {
    repo.files()
        .map(|file| (file.path.clone(), file.tasks().len()))
        .collect()
}

#[test]
fn moved_task_lands_at_requested_rank() {
    for target in ["TODO", "DOING", "DONE"] {
        let probe = open(&store(), true);
        let siblings = without(&ids(&probe, target), id(&probe, "code store")).len();

        for position in 0..=siblings {
            let mut repo = open(&store(), true);
            let moved = id(&repo, "code store");
            let total = repo.tasks().count();
            let before_source = ids(&repo, "DOING");
            let before_target = ids(&repo, target);

            repo.move_tasks(&[moved], target, position)
                .unwrap_or_else(|err| panic!("move to {target}@{position}: {err}"));

            let after_target = ids(&repo, target);
            assert_eq!(after_target[position], moved, "{target}@{position}");
            assert_eq!(
                without(&after_target, moved),
                without(&before_target, moved),
                "{target}@{position}"
            );
            assert_eq!(
                without(&ids(&repo, "DOING"), moved),
                without(&before_source, moved)
            );
            assert_eq!(repo.tasks().count(), total);
            if target != "DOING" {
                assert_eq!(ids(&repo, "DOING").len(), before_source.len() - 1);
                assert_eq!(after_target.len(), before_target.len() + 1);
            }
        }
    }
}

#[test]
fn persisted_order_reads_back_as_the_key() {
    let store = store();
    let mut repo = open(&store, true);
    let moved = id(&repo, "code parser");

    repo.move_tasks(&[moved], "TODO", 2).expect("move");
    let key = repo.find_task(moved).and_then(|task| task.order).expect("keyed");

    let reloaded = open(&store, true);
    let task = reloaded.find_task(id(&reloaded, "code parser")).expect("task");
    assert_eq!(task.list, "TODO");
    assert_eq!(task.order, Some(key));
    assert_eq!(task.meta.first(ORDER_KEY), Some(key.to_string().as_str()));
}

#[test]
fn position_mode_writes_no_order_and_keeps_rank() {
    let store = store();
    let mut repo = open(&store, false);
    let moved = id(&repo, "code store");

    repo.move_tasks(&[moved], "TODO", 1).expect("move");

    assert_eq!(ids(&repo, "TODO")[1], moved);
    assert_eq!(
        store.contents("TODO.md").as_deref(),
        Some(
            "# Board
- [ ] #TODO write spec order:0
- [ ] #TODO code store
- [ ] #TODO draft api order:10
- [ ] #TODO review order:20
- [ ] #DOING code parser
- [x] #DONE setup repo
"
        )
    );
    let task = repo.find_task(moved).expect("task");
    assert!(!task.has_persisted_order());
    assert_eq!(task.line, 3);
}

#[test]
fn position_mode_rank_survives_reload() {
    let store = MemoryStore::new().with_file(
        "TODO.md",
        "#TODO a order:0\n#TODO b order:10\n#DOING x\n",
    );
    let mut repo = open(&store, false);
    let moved = id(&repo, "x");

    repo.move_tasks(&[moved], "TODO", 0).expect("move");

    assert_eq!(
        store.contents("TODO.md").as_deref(),
        Some("#TODO x\n#TODO a order:0\n#TODO b order:10\n")
    );
    let texts = |repo: &Repository<MemoryStore>| -> Vec<String> {
        repo.tasks_in_list("TODO")
            .into_iter()
            .map(|task| task.text.clone())
            .collect()
    };
    assert_eq!(texts(&repo), vec!["x", "a", "b"]);
    assert_eq!(texts(&open(&store, false)), vec!["x", "a", "b"]);
}

#[test]
fn moving_to_current_rank_is_byte_identical() {
    let store = store();
    let mut repo = open(&store, true);
    let moved = id(&repo, "draft api");

    let outcome = repo
        .move_task(MoveRequest {
            task: moved,
            new_list: "TODO".into(),
            new_pos: 1,
        })
        .expect("move");

    assert!(outcome.is_noop());
    assert!(store.writes().is_empty());
    assert_eq!(store.contents("TODO.md").as_deref(), Some(BOARD));
}

#[test]
fn insert_above_lowest_key_extends_downward() {
    let store = store();
    let mut repo = open(&store, true);
    let keyed: Vec<TaskId> = ids(&repo, "TODO").into_iter().take(3).collect();
    let moved = id(&repo, "code parser");

    repo.move_tasks(&[moved], "TODO", 0).expect("move");

    assert_eq!(repo.find_task(moved).and_then(|t| t.order), Some(-10));
    let keys: Vec<Option<i64>> = keyed
        .iter()
        .map(|id| repo.find_task(*id).and_then(|t| t.order))
        .collect();
    assert_eq!(keys, vec![Some(0), Some(10), Some(20)]);
}

#[test]
fn code_comment_moves_between_lists() {
    let store = store();
    let mut repo = open(&store, true);
    let moved = id(&repo, "leak in cache");
    let per_file = tasks_per_file(&repo);
    let todo = ids(&repo, "TODO").len();
    let fixme = ids(&repo, "FIXME").len();

    let outcome = repo.move_tasks(&[moved], "TODO", 0).expect("move");

    assert_eq!(outcome.changed_paths, vec!["src/lib.rs".to_owned()]);
    assert_eq!(ids(&repo, "TODO").len(), todo + 1);
    assert_eq!(ids(&repo, "FIXME").len(), fixme - 1);
    assert_eq!(tasks_per_file(&repo), per_file);
    assert_eq!(
        store.contents("src/lib.rs").as_deref(),
        Some("// TODO: handle unicode\nfn main() {}\n// TODO: leak in cache order:-10\n")
    );
}

#[test]
fn batch_move_empties_doing() {
    let store = store();
    let mut repo = open(&store, true);
    let doing = ids(&repo, "DOING");
    let done = ids(&repo, "DONE").len();
    let total = repo.tasks().count();

    let outcome = repo.move_tasks(&doing, "DONE", done).expect("move");

    assert_eq!(outcome.moved, doing);
    assert!(ids(&repo, "DOING").is_empty());
    assert_eq!(ids(&repo, "DONE").len(), done + doing.len());
    assert_eq!(ids(&repo, "DONE")[done..], doing[..]);
    assert_eq!(repo.tasks().count(), total);
}

#[test]
fn duplicate_ids_move_once() {
    let mut repo = open(&store(), true);
    let moved = id(&repo, "review");

    let outcome = repo.move_tasks(&[moved, moved], "DONE", 0).expect("move");

    assert_eq!(outcome.moved, vec![moved]);
    assert_eq!(ids(&repo, "DONE").first(), Some(&moved));
}

#[test]
fn virtual_and_unknown_targets_are_rejected() {
    let store = store();
    let mut repo = open(&store, true);
    let moved = id(&repo, "review");

    for target in ["URGENT", "LATER"] {
        let Err(err) = repo.move_tasks(&[moved], target, 0) else {
            panic!("{target} should be rejected");
        };
        assert!(matches!(err, BoardError::InvalidTarget { ref list, .. } if list == target));
    }
    assert!(store.writes().is_empty());
}

#[test]
fn stale_id_is_task_not_found() {
    let mut repo = open(&store(), true);
    let stale = TaskId::new();

    let Err(err) = repo.move_tasks(&[stale], "DONE", 0) else {
        panic!("stale id should fail");
    };
    assert!(matches!(err, BoardError::TaskNotFound(id) if id == stale));
}

#[test]
fn failed_write_leaves_board_and_files_untouched() {
    let store = store();
    let mut repo = open(&store, true);
    let moving = vec![id(&repo, "handle unicode"), id(&repo, "code store")];
    let before = ids(&repo, "DONE");
    store.fail_writes_to("src/lib.rs");

    let Err(err) = repo.move_tasks(&moving, "DONE", 0) else {
        panic!("write should fail");
    };

    assert!(matches!(err, BoardError::PersistenceError { ref path, .. } if path == "src/lib.rs"));
    assert_eq!(ids(&repo, "DONE"), before);
    assert_eq!(store.contents("TODO.md").as_deref(), Some(BOARD));
    assert_eq!(store.contents("src/lib.rs").as_deref(), Some(SOURCE));
}

#[test]
fn crowded_keys_renumber_a_window() {
    let store = MemoryStore::new().with_file(
        "TODO.md",
        "#TODO a order:0\n#TODO b order:10\n#TODO c order:11\n#TODO d order:12\n#TODO e order:40\n#DONE x\n",
    );
    let mut repo = open(&store, true);
    let moved = id(&repo, "x");

    repo.move_tasks(&[moved], "TODO", 2).expect("move");

    assert_eq!(
        store.contents("TODO.md").as_deref(),
        Some(
            "#TODO a order:0\n#TODO b order:3\n#TODO c order:9\n#TODO d order:12\n#TODO e order:40\n#TODO x order:6\n"
        )
    );
    let texts: Vec<String> = repo
        .tasks_in_list("TODO")
        .into_iter()
        .map(|task| task.text.clone())
        .collect();
    assert_eq!(texts, vec!["a", "b", "x", "c", "d", "e"]);
}

#[test]
fn added_task_joins_default_list() {
    let store = store();
    let mut repo = open(&store, true);

    let task = repo
        .add_task_to_file(AddTask {
            text: "ship it +urgent".into(),
            ..AddTask::default()
        })
        .expect("add");

    assert_eq!(task.line, 8);
    assert_eq!(task.order, Some(40));
    assert_eq!(ids(&repo, "TODO")[4], task.id);
    assert_eq!(ids(&repo, "URGENT"), vec![task.id]);
    assert!(
        store
            .contents("TODO.md")
            .is_some_and(|text| text.ends_with("- [x] #DONE setup repo\n#TODO ship it +urgent order:40\n"))
    );
    // The unkeyed predecessor is keyed first so the new card can follow it.
    assert_eq!(
        store.contents("src/lib.rs").as_deref(),
        Some("// TODO: handle unicode order:30\nfn main() {}\n// FIXME: leak in cache\n")
    );
}

#[test]
fn modify_task_rewrites_one_line() {
    let store = store();
    let mut repo = open(&store, true);
    let mut task = repo.find_task(id(&repo, "review")).cloned().expect("task");
    task.text = "review docs +urgent".into();

    let file = repo.modify_task(&task, true).expect("modify");

    assert_eq!(
        file.content,
        BOARD.replace("#TODO review order:20", "#TODO review docs +urgent order:20")
    );
    assert_eq!(ids(&repo, "URGENT"), vec![task.id]);
    assert_eq!(ids(&repo, "TODO")[2], task.id);
}

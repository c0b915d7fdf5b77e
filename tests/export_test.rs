//! Integration tests for the paginated CSV export

mod common;

use lootbook::progress::{ExportRow, Level, NO_PRIZE, Player, ProgressManager};

use common::{count_rows, seed_scenario, temp_manager};

const PLAYER: &str = "super_unique_id";

fn export_string(manager: &ProgressManager, page_size: usize) -> String {
    let mut out = Vec::new();
    manager
        .exporter()
        .with_page_size(page_size)
        .write_csv(&mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn collect_rows(manager: &ProgressManager, page_size: usize) -> Vec<ExportRow> {
    manager
        .exporter()
        .with_page_size(page_size)
        .rows()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// Three players, one without prizes and one with two levels
fn seed_many(manager: &ProgressManager) {
    seed_scenario(manager);
    manager.complete_level(PLAYER, 1).unwrap();
    manager.award_prizes(PLAYER, 1, &[1, 2]).unwrap();

    manager.levels().create(&Level::new(2, "Level 2")).unwrap();
    for id in ["alpha", "zulu"] {
        manager.players().create(&Player::new(id)).unwrap();
    }
    manager.player_levels().start("alpha", 1).unwrap();
    manager.player_levels().start("alpha", 2).unwrap();
    manager.complete_level("alpha", 2).unwrap();
    manager.award_prizes("alpha", 2, &[2]).unwrap();
    manager.player_levels().start("zulu", 2).unwrap();
}

#[test]
fn test_completed_scenario_export() {
    let (_dir, manager) = temp_manager();
    seed_scenario(&manager);
    manager.complete_level(PLAYER, 1).unwrap();
    let awards = manager.award_prizes(PLAYER, 1, &[1, 2]).unwrap();
    for award in &awards {
        manager.claim_prize(award.id).unwrap();
    }

    let csv = export_string(&manager, 1000);
    assert_eq!(
        csv,
        "player_id,level_title,is_completed,prize_title\r\n\
         super_unique_id,Level 1,True,Prize 1\r\n\
         super_unique_id,Level 1,True,Prize 2\r\n"
    );
}

#[test]
fn test_incomplete_level_exports_no_prize() {
    let (_dir, manager) = temp_manager();
    seed_scenario(&manager);
    assert!(manager.award_prizes(PLAYER, 1, &[1, 2]).is_err());

    let rows = collect_rows(&manager, 1000);
    assert_eq!(
        rows,
        vec![ExportRow {
            player_id: PLAYER.to_string(),
            level_title: "Level 1".to_string(),
            is_completed: false,
            prize_title: NO_PRIZE.to_string(),
        }]
    );
    assert!(export_string(&manager, 1000).ends_with("super_unique_id,Level 1,False,No Prize\r\n"));
}

#[test]
fn test_empty_database_exports_header_only() {
    let (_dir, manager) = temp_manager();
    assert_eq!(
        export_string(&manager, 10),
        "player_id,level_title,is_completed,prize_title\r\n"
    );
    assert_eq!(manager.exporter().pages().count(), 0);
}

#[test]
fn test_rows_are_ordered_by_player() {
    let (_dir, manager) = temp_manager();
    seed_many(&manager);

    let rows = collect_rows(&manager, 1000);
    let summary: Vec<_> = rows
        .iter()
        .map(|r| (r.player_id.as_str(), r.level_title.as_str(), r.prize_title.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            ("alpha", "Level 1", NO_PRIZE),
            ("alpha", "Level 2", "Prize 2"),
            (PLAYER, "Level 1", "Prize 1"),
            (PLAYER, "Level 1", "Prize 2"),
            ("zulu", "Level 2", NO_PRIZE),
        ]
    );
}

#[test]
fn test_page_size_does_not_change_output() {
    let (_dir, manager) = temp_manager();
    seed_many(&manager);

    let expected = collect_rows(&manager, 1000);
    for page_size in [1, 2, 3, 5] {
        assert_eq!(collect_rows(&manager, page_size), expected, "page size {page_size}");
    }

    let pages: Vec<_> = manager
        .exporter()
        .with_page_size(2)
        .pages()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), [2, 2, 1]);
}

#[test]
fn test_write_csv_file_creates_parents() {
    let (dir, manager) = temp_manager();
    seed_many(&manager);

    let path = dir.path().join("out").join("player_levels.csv");
    let written = manager.exporter().write_csv_file(&path).unwrap();
    assert_eq!(written, path);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 6);
    assert!(content.starts_with("player_id,level_title,is_completed,prize_title\r\n"));
}

#[test]
fn test_export_does_not_write() {
    let (_dir, manager) = temp_manager();
    seed_many(&manager);

    let tables = ["player", "level", "prize", "player_level", "level_prize"];
    let before: Vec<_> = tables.iter().map(|t| count_rows(&manager, t)).collect();
    let _ = collect_rows(&manager, 2);
    let after: Vec<_> = tables.iter().map(|t| count_rows(&manager, t)).collect();
    assert_eq!(before, after);

    let unclaimed = manager.level_prizes().list_unclaimed_for_player(PLAYER).unwrap();
    assert_eq!(unclaimed.len(), 2);
}

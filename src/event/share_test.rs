use crate::event::can_see;
use crate::event::Share;
use crate::test_utils::roll_event;
use crate::test_utils::test_player;

#[test]
fn test_author_always_sees_own_events() {
    let author = test_player("p1", "Alice");
    for share in Share::ALL {
        let event = roll_event(&author, share, vec![3, 4]);
        assert!(can_see(&author.id, false, &event), "share {}", share);
        assert!(can_see(&author.id, true, &event), "share {}", share);
    }
}

#[test]
fn test_non_author_non_gm_sees_only_in_game() {
    let author = test_player("p1", "Alice");
    for share in Share::ALL {
        let event = roll_event(&author, share, vec![3, 4]);
        assert_eq!(can_see("p2", false, &event), share == Share::InGame, "share {}", share);
    }
}

#[test]
fn test_gm_sees_in_game_and_gm_shared() {
    let author = test_player("p1", "Alice");
    for share in Share::ALL {
        let event = roll_event(&author, share, vec![3, 4]);
        assert_eq!(can_see("gm1", true, &event), share != Share::Private, "share {}", share);
    }
}

#[test]
fn test_share_serializes_as_discriminant() {
    assert_eq!(serde_json::to_string(&Share::InGame).unwrap(), "0");
    assert_eq!(serde_json::to_string(&Share::Private).unwrap(), "1");
    assert_eq!(serde_json::to_string(&Share::GMs).unwrap(), "2");

    let share: Share = serde_json::from_str("2").unwrap();
    assert_eq!(share, Share::GMs);
}

#[test]
fn test_unknown_share_discriminant_is_rejected() {
    let result: Result<Share, _> = serde_json::from_str("7");
    assert!(result.is_err());
}

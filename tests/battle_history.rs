mod common;

use common::{genome, ArenaBuilder, NOW};
use zombie_arena_lib::model::error::{ArenaError, ErrorKind};
use zombie_arena_lib::model::matchmaking::{Opponent, Pairing};
use zombie_arena_lib::model::state::{BattleRequest, BattleStatus, Creature, SYNTHETIC_OWNER};

fn pairing() -> Pairing {
    Pairing {
        request: BattleRequest::new("0xalice", 0, NOW),
        opponent: Opponent::Human(BattleRequest::new("0xbob", 1, NOW)),
    }
}

#[tokio::test]
async fn test_history_is_capped_and_survives_restart() {
    let (arena, _, store) = ArenaBuilder::new()
        .with_creature("0xalice", 3, 0, 0)
        .with_creature("0xbob", 3, 0, 0)
        .build();

    for i in 0..55 {
        let id = arena.battles.start(pairing(), NOW + i).await.unwrap();
        arena.battles.flee(id, NOW + i).await.unwrap();
    }
    let history = arena.battles.history().await;
    assert_eq!(history.len(), 50);
    assert_eq!(history[0].ended_at, Some(NOW + 54));
    assert_eq!(history[49].ended_at, Some(NOW + 5));
    assert!(arena.battles.active_battles().await.is_empty());
    assert_eq!(arena.metrics().snapshot().battles_fled, 55);

    let (restarted, _, _) = ArenaBuilder::new()
        .with_creature("0xalice", 3, 0, 0)
        .with_creature("0xbob", 3, 0, 0)
        .with_store(store)
        .build();
    let restored = restarted.battles.history().await;
    assert_eq!(restored.len(), 50);
    assert_eq!(restored[0].id, history[0].id);
    assert_eq!(restored[0].status, BattleStatus::Fled);
}

#[tokio::test]
async fn test_attack_resolves_and_updates_counters() {
    let (arena, chain, _) = ArenaBuilder::new()
        .with_creature("0xalice", 3, 4, 1)
        .with_creature("0xbob", 3, 2, 2)
        .build();

    let id = arena.battles.start(pairing(), NOW).await.unwrap();
    let status = arena.battles.attack(id, NOW + 1).await.unwrap();
    assert!(status.is_terminal());
    assert_eq!(chain.submitted_attacks(), 1);

    let history = arena.battles.history().await;
    let battle = &history[0];
    assert_eq!(battle.status, status);
    assert_eq!(battle.round, 2);
    assert_eq!(battle.log[0], "Battle started! Choose your action.");
    assert!(battle.log[1].starts_with("Round 1: "));
    let attacker = battle.combatant1.creature.as_ref().unwrap();
    match status {
        BattleStatus::ResolvedWin => {
            assert_eq!(attacker.win_count, 5);
            assert!(battle.log[2].starts_with("VICTORY!"));
        }
        BattleStatus::ResolvedLoss => {
            assert_eq!(attacker.loss_count, 2);
            assert!(battle.log[2].starts_with("DEFEAT!"));
        }
        other => panic!("unexpected status {}", other),
    }

    let err = arena.battles.flee(id, NOW + 2).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ArenaError>().unwrap().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_failed_attack_keeps_battle_active() {
    let (arena, chain, _) = ArenaBuilder::new()
        .with_creature("0xalice", 3, 0, 0)
        .with_creature("0xbob", 3, 0, 0)
        .build();
    let id = arena.battles.start(pairing(), NOW).await.unwrap();

    chain.fail_next_attack("execution reverted").unwrap();
    let err = arena.battles.attack(id, NOW + 1).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ArenaError>().unwrap().kind(),
        ErrorKind::Collaborator
    );

    let battle = arena.battles.battle(id).await.unwrap();
    assert_eq!(battle.status, BattleStatus::Active);
    assert!(battle.log.last().unwrap().starts_with("Attack failed:"));
    assert!(arena.battles.history().await.is_empty());

    assert!(arena.battles.attack(id, NOW + 2).await.is_ok());
    assert_eq!(arena.battles.history().await.len(), 1);
}

#[tokio::test]
async fn test_recovering_attacker_is_turned_away() {
    let (arena, chain, _) = ArenaBuilder::new()
        .with_creature("0xalice", 3, 0, 0)
        .with_creature("0xbob", 3, 0, 0)
        .build();
    chain.set_ready_time(0, NOW + 86_400).unwrap();
    let id = arena.battles.start(pairing(), NOW).await.unwrap();

    let err = arena.battles.attack(id, NOW).await.unwrap_err();
    let err = err.downcast_ref::<ArenaError>().unwrap();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(err.to_string().contains("24h 0m"), "{}", err);
    assert_eq!(chain.submitted_attacks(), 0);
    assert!(arena.battles.history().await.is_empty());

    let status = arena.battles.attack(id, NOW + 86_400).await.unwrap();
    assert!(status.is_terminal());
}

#[tokio::test]
async fn test_synthetic_battle_is_never_submitted() {
    let (arena, chain, _) = ArenaBuilder::new()
        .with_creature("0xalice", 3, 0, 0)
        .with_creature("0xbob", 3, 0, 0)
        .build();
    // Shares an id with bob's ledger entry.
    let ai = Creature {
        id: 1,
        owner: SYNTHETIC_OWNER.to_string(),
        name: "Grave Walker 12".to_string(),
        genome: genome(1),
        level: 2,
        win_count: 3,
        loss_count: 1,
        ready_time: 0,
    };
    let id = arena
        .battles
        .start(
            Pairing {
                request: BattleRequest::new("0xalice", 0, NOW),
                opponent: Opponent::Synthetic(ai),
            },
            NOW,
        )
        .await
        .unwrap();

    let err = arena.battles.attack(id, NOW + 1).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ArenaError>(),
        Some(ArenaError::SyntheticOpponent(_))
    ));
    assert_eq!(chain.submitted_attacks(), 0);
    arena.battles.flee(id, NOW + 2).await.unwrap();
    assert_eq!(arena.battles.history().await[0].status, BattleStatus::Fled);
}

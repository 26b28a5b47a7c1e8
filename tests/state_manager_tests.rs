use std::sync::Arc;
use fund_dispatcher::state_manager::StateManager;

#[test]
fn test_second_claim_is_refused_while_guard_held() {
    let states = StateManager::new();

    let guard = states.try_begin("Chia").expect("first claim succeeds");
    assert!(guard.state().is_dispatching());
    assert!(states.try_begin("Chia").is_none());

    drop(guard);
    assert!(!states.state("Chia").is_dispatching());
    assert!(states.try_begin("Chia").is_some());
}

#[test]
fn test_wallets_are_tracked_independently() {
    let states = StateManager::new();

    let _chia = states.try_begin("Chia").unwrap();
    let other = states.try_begin("Flax");
    assert!(other.is_some());
    assert_eq!(states.tracked_wallets(), 2);
}

#[test]
fn test_guard_released_on_early_return() {
    fn cycle(states: &StateManager) -> Result<(), &'static str> {
        let _guard = states.try_begin("Chia").ok_or("busy")?;
        Err("rpc failed")
    }

    let states = StateManager::new();
    assert_eq!(cycle(&states), Err("rpc failed"));
    assert_eq!(cycle(&states), Err("rpc failed"));
    assert!(!states.state("Chia").is_dispatching());
}

#[test]
fn test_unreachable_notice_is_edge_triggered() {
    let states = StateManager::new();
    let state = states.state("Chia");

    assert!(state.mark_unreachable());
    assert!(!state.mark_unreachable());
    assert!(!state.mark_unreachable());
    assert!(state.is_unreachable());

    assert!(state.mark_reachable());
    assert!(!state.mark_reachable());
    assert!(state.mark_unreachable());
}

#[tokio::test]
async fn test_concurrent_claims_yield_single_owner() {
    let states = Arc::new(StateManager::new());
    let barrier = Arc::new(tokio::sync::Barrier::new(10));

    let mut handles = vec![];
    for _ in 0..10 {
        let states = Arc::clone(&states);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let guard = states.try_begin("Chia");
            let claimed = guard.is_some();
            // Hold any guard until every task has tried.
            barrier.wait().await;
            drop(guard);
            claimed
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert!(!states.state("Chia").is_dispatching());
}

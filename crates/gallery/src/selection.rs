//! Selection state machine.
//!
//! Transport-agnostic rules for adding channels, hitting the cap, and
//! confirming or cancelling a clear. The only state beyond the stored
//! galleries is the set of users with an open "clear?" prompt, which is
//! ephemeral and never persisted: the prompt itself carries the owner id, so
//! a confirmation arriving after a restart is still honoured.

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    store::{AddOutcome, GalleryStore},
    user::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    /// The user tried to add to a full gallery and was asked to clear it.
    AwaitingClearConfirmation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    Add(String),
    /// Confirm clearing the gallery owned by `owner`.
    ConfirmClear { owner: UserId },
    CancelClear,
    ClearNow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Added { count: usize },
    AlreadyPresent,
    /// The gallery is full; ask `owner` whether to clear it.
    ConfirmClearPrompt { owner: UserId },
    Cleared { removed: usize },
    Kept { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub outcome: SelectionOutcome,
    pub state: SelectionState,
}

impl Transition {
    fn idle(outcome: SelectionOutcome) -> Self {
        Self {
            outcome,
            state: SelectionState::Idle,
        }
    }
}

pub struct SelectionMachine {
    store: Arc<GalleryStore>,
    /// Users with an outstanding clear prompt (std Mutex: never held across
    /// an `.await`).
    pending: std::sync::Mutex<HashSet<UserId>>,
}

impl SelectionMachine {
    pub fn new(store: Arc<GalleryStore>) -> Self {
        Self {
            store,
            pending: std::sync::Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &GalleryStore {
        &self.store
    }

    pub fn state(&self, user: &UserId) -> SelectionState {
        if self.pending_set().contains(user) {
            SelectionState::AwaitingClearConfirmation
        } else {
            SelectionState::Idle
        }
    }

    /// Apply `command` issued by `caller`.
    pub async fn handle(&self, caller: &UserId, command: SelectionCommand) -> Result<Transition> {
        debug!(user_id = %caller, ?command, state = ?self.state(caller), "selection command");
        match command {
            SelectionCommand::Add(key) => self.add(caller, &key).await,
            SelectionCommand::ConfirmClear { owner } => {
                if &owner != caller {
                    warn!(
                        caller = %caller,
                        owner = %owner,
                        "rejected clear confirmation for another user's gallery"
                    );
                    return Err(Error::NotOwner {
                        caller: caller.clone(),
                        owner,
                    });
                }
                self.clear(caller).await
            },
            SelectionCommand::CancelClear => {
                self.pending_set().remove(caller);
                let count = self.store.len(caller).await;
                Ok(Transition::idle(SelectionOutcome::Kept { count }))
            },
            SelectionCommand::ClearNow => self.clear(caller).await,
        }
    }

    async fn add(&self, user: &UserId, key: &str) -> Result<Transition> {
        match self.store.add(user, key).await? {
            AddOutcome::Added { count } => {
                self.pending_set().remove(user);
                Ok(Transition::idle(SelectionOutcome::Added { count }))
            },
            AddOutcome::AlreadyPresent => Ok(Transition {
                outcome: SelectionOutcome::AlreadyPresent,
                state: self.state(user),
            }),
            AddOutcome::CapacityReached => {
                self.pending_set().insert(user.clone());
                info!(user_id = %user, key, "gallery full, asking to clear");
                Ok(Transition {
                    outcome: SelectionOutcome::ConfirmClearPrompt {
                        owner: user.clone(),
                    },
                    state: SelectionState::AwaitingClearConfirmation,
                })
            },
        }
    }

    async fn clear(&self, user: &UserId) -> Result<Transition> {
        let removed = self.store.clear(user).await?;
        self.pending_set().remove(user);
        Ok(Transition::idle(SelectionOutcome::Cleared { removed }))
    }

    fn pending_set(&self) -> std::sync::MutexGuard<'_, HashSet<UserId>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{GALLERY_CAPACITY, GalleryPersistence, store_memory::InMemoryGalleryPersistence},
    };

    async fn machine() -> SelectionMachine {
        let persistence: Arc<dyn GalleryPersistence> = Arc::new(InMemoryGalleryPersistence::new());
        SelectionMachine::new(Arc::new(GalleryStore::open(persistence).await))
    }

    async fn fill(machine: &SelectionMachine, user: &UserId) {
        for i in 0..GALLERY_CAPACITY {
            machine
                .handle(user, SelectionCommand::Add(format!("ch{i}")))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn add_below_cap_stays_idle() {
        let m = machine().await;
        let u = UserId::from(1);
        let t = m.handle(&u, SelectionCommand::Add("ntv".into())).await.unwrap();
        assert_eq!(t.outcome, SelectionOutcome::Added { count: 1 });
        assert_eq!(t.state, SelectionState::Idle);
        assert_eq!(m.state(&u), SelectionState::Idle);
    }

    #[tokio::test]
    async fn add_at_cap_prompts_for_clear() {
        let m = machine().await;
        let u = UserId::from(1);
        fill(&m, &u).await;

        let t = m.handle(&u, SelectionCommand::Add("extra".into())).await.unwrap();
        assert_eq!(
            t.outcome,
            SelectionOutcome::ConfirmClearPrompt { owner: u.clone() }
        );
        assert_eq!(t.state, SelectionState::AwaitingClearConfirmation);
        assert_eq!(m.state(&u), SelectionState::AwaitingClearConfirmation);
        assert_eq!(m.store().len(&u).await, GALLERY_CAPACITY);
    }

    #[tokio::test]
    async fn confirm_by_owner_clears() {
        let m = machine().await;
        let u = UserId::from(1);
        fill(&m, &u).await;
        m.handle(&u, SelectionCommand::Add("extra".into())).await.unwrap();

        let t = m
            .handle(&u, SelectionCommand::ConfirmClear { owner: u.clone() })
            .await
            .unwrap();
        assert_eq!(
            t.outcome,
            SelectionOutcome::Cleared {
                removed: GALLERY_CAPACITY
            }
        );
        assert_eq!(m.state(&u), SelectionState::Idle);
        assert!(m.store().get(&u).await.is_empty());
    }

    #[tokio::test]
    async fn confirm_by_someone_else_is_rejected() {
        let m = machine().await;
        let owner = UserId::from(1);
        let intruder = UserId::from(2);
        fill(&m, &owner).await;
        m.handle(&owner, SelectionCommand::Add("extra".into())).await.unwrap();

        let err = m
            .handle(&intruder, SelectionCommand::ConfirmClear {
                owner: owner.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotOwner { .. }));
        assert_eq!(m.store().len(&owner).await, GALLERY_CAPACITY);
        assert_eq!(m.state(&owner), SelectionState::AwaitingClearConfirmation);
    }

    #[tokio::test]
    async fn cancel_keeps_gallery() {
        let m = machine().await;
        let u = UserId::from(1);
        fill(&m, &u).await;
        m.handle(&u, SelectionCommand::Add("extra".into())).await.unwrap();

        let t = m.handle(&u, SelectionCommand::CancelClear).await.unwrap();
        assert_eq!(
            t.outcome,
            SelectionOutcome::Kept {
                count: GALLERY_CAPACITY
            }
        );
        assert_eq!(m.state(&u), SelectionState::Idle);
        assert_eq!(m.store().len(&u).await, GALLERY_CAPACITY);
    }

    #[tokio::test]
    async fn clear_now_works_from_any_state() {
        let m = machine().await;
        let u = UserId::from(1);
        m.handle(&u, SelectionCommand::Add("a".into())).await.unwrap();
        m.handle(&u, SelectionCommand::Add("b".into())).await.unwrap();

        let t = m.handle(&u, SelectionCommand::ClearNow).await.unwrap();
        assert_eq!(t.outcome, SelectionOutcome::Cleared { removed: 2 });

        fill(&m, &u).await;
        m.handle(&u, SelectionCommand::Add("extra".into())).await.unwrap();
        let t = m.handle(&u, SelectionCommand::ClearNow).await.unwrap();
        assert_eq!(
            t.outcome,
            SelectionOutcome::Cleared {
                removed: GALLERY_CAPACITY
            }
        );
        assert_eq!(t.state, SelectionState::Idle);
    }

    #[tokio::test]
    async fn already_present_does_not_change_state() {
        let m = machine().await;
        let u = UserId::from(1);
        m.handle(&u, SelectionCommand::Add("a".into())).await.unwrap();
        let t = m.handle(&u, SelectionCommand::Add("a".into())).await.unwrap();
        assert_eq!(t.outcome, SelectionOutcome::AlreadyPresent);
        assert_eq!(t.state, SelectionState::Idle);
    }

    #[tokio::test]
    async fn confirm_without_prompt_still_clears_own_gallery() {
        let m = machine().await;
        let u = UserId::from(4);
        m.handle(&u, SelectionCommand::Add("a".into())).await.unwrap();
        let t = m
            .handle(&u, SelectionCommand::ConfirmClear { owner: u.clone() })
            .await
            .unwrap();
        assert_eq!(t.outcome, SelectionOutcome::Cleared { removed: 1 });
    }
}

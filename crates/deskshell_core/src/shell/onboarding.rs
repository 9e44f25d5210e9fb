//! Onboarding gate: the outer two-state machine.
//!
//! # Invariants
//! - Missing, blank or unreadable profiles all mean onboarding owns the screen.
//! - Ownership moves to navigation at most once and never moves back.
//! - The gate never writes the profile; the onboarding flow does.

use crate::store::{ProfileStore, StoreResult, UserProfile};
use log::{info, warn};

/// Who owns the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenOwner {
    Onboarding,
    Navigation,
}

#[derive(Debug, Clone)]
pub struct OnboardingGate {
    profile: Option<UserProfile>,
}

impl OnboardingGate {
    /// Builds the gate from the startup profile lookup.
    pub fn from_lookup(lookup: StoreResult<Option<UserProfile>>) -> Self {
        let profile = accept_profile(lookup, "startup");
        let gate = Self { profile };
        info!(
            "event=onboarding_gate module=onboarding status=ok stage=startup owner={:?}",
            gate.owner()
        );
        gate
    }

    pub fn should_show_onboarding(&self) -> bool {
        self.profile.is_none()
    }

    pub fn owner(&self) -> ScreenOwner {
        if self.should_show_onboarding() {
            ScreenOwner::Onboarding
        } else {
            ScreenOwner::Navigation
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Re-queries the profile store and hands the screen to navigation when a
    /// profile is now present.
    ///
    /// Returns `true` only on the call that flips ownership.
    pub fn complete(&mut self, store: &dyn ProfileStore) -> bool {
        self.apply_completion(store.get_profile())
    }

    /// Completion with an already performed profile lookup.
    pub fn apply_completion(&mut self, lookup: StoreResult<Option<UserProfile>>) -> bool {
        if !self.should_show_onboarding() {
            return false;
        }
        self.profile = accept_profile(lookup, "complete");
        if self.should_show_onboarding() {
            warn!(
                "event=onboarding_complete module=onboarding status=error reason=profile_absent"
            );
            return false;
        }
        info!("event=onboarding_complete module=onboarding status=ok owner=Navigation");
        true
    }
}

fn accept_profile(
    lookup: StoreResult<Option<UserProfile>>,
    stage: &'static str,
) -> Option<UserProfile> {
    match lookup {
        Ok(profile) => profile.filter(|profile| !profile.name.trim().is_empty()),
        Err(err) => {
            warn!(
                "event=profile_lookup module=onboarding status=error stage={stage} error={err}"
            );
            None
        }
    }
}

use super::FailureKind;

/// 合成セッションの状態（前方にのみ遷移する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Accumulating,
    Finalizing,
    Succeeded,
    Failed { kind: FailureKind, reason: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Accumulating => "accumulating",
            Self::Finalizing => "finalizing",
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }

    /// `next` への遷移が許可されるか
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Accumulating)
                | (Idle, Failed { .. })
                | (Accumulating, Accumulating)
                | (Accumulating, Finalizing)
                | (Accumulating, Failed { .. })
                | (Finalizing, Succeeded)
                | (Finalizing, Failed { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> SessionState {
        SessionState::Failed {
            kind: FailureKind::Internal,
            reason: "x".into(),
        }
    }

    #[test]
    fn forward_only() {
        assert!(SessionState::Idle.can_transition_to(&SessionState::Accumulating));
        assert!(SessionState::Accumulating.can_transition_to(&SessionState::Accumulating));
        assert!(SessionState::Accumulating.can_transition_to(&SessionState::Finalizing));
        assert!(SessionState::Accumulating.can_transition_to(&failed()));
        assert!(SessionState::Finalizing.can_transition_to(&SessionState::Succeeded));
        assert!(SessionState::Finalizing.can_transition_to(&failed()));

        assert!(!SessionState::Idle.can_transition_to(&SessionState::Finalizing));
        assert!(!SessionState::Accumulating.can_transition_to(&SessionState::Succeeded));
        assert!(!SessionState::Finalizing.can_transition_to(&SessionState::Accumulating));
        assert!(!SessionState::Succeeded.can_transition_to(&failed()));
        assert!(!failed().can_transition_to(&SessionState::Idle));
    }
}

use std::fmt;

/// The closed set of policy configuration kinds a `type` discriminator can
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Retry,
    Timeout,
    CircuitBreaker,
    AdvancedCircuitBreaker,
    Bulkhead,
    Cache,
    Fallback,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 7] = [
        PolicyKind::Retry,
        PolicyKind::Timeout,
        PolicyKind::CircuitBreaker,
        PolicyKind::AdvancedCircuitBreaker,
        PolicyKind::Bulkhead,
        PolicyKind::Cache,
        PolicyKind::Fallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Retry => "Retry",
            PolicyKind::Timeout => "Timeout",
            PolicyKind::CircuitBreaker => "CircuitBreaker",
            PolicyKind::AdvancedCircuitBreaker => "AdvancedCircuitBreaker",
            PolicyKind::Bulkhead => "Bulkhead",
            PolicyKind::Cache => "Cache",
            PolicyKind::Fallback => "Fallback",
        }
    }

    /// Resolves a discriminator case-insensitively. A trailing `Config` is
    /// accepted, so `"retry"`, `"Retry"` and `"RetryConfig"` all name
    /// [`PolicyKind::Retry`].
    pub fn resolve(discriminator: &str) -> Option<Self> {
        let name = discriminator.trim();
        let name = match name.len().checked_sub("config".len()) {
            Some(split)
                if name.is_char_boundary(split)
                    && name[split..].eq_ignore_ascii_case("config") =>
            {
                &name[..split]
            }
            _ => name,
        };
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

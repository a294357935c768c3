//! Payload kinds carried by command and event envelopes.
//!
//! A payload kind is a closed enum with one variant per business intent
//! (commands) or per recorded fact (events). Each variant wraps a plain struct
//! implementing [`Variant`], which gives it a stable type name plus a way in
//! and out of the enum. Dispatch registries key on that type name, so no
//! runtime type inspection is needed.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DomainError;

/// A closed set of payload variants.
pub trait PayloadKind: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Stable type name of the wrapped variant (used for routing and storage).
    fn type_name(&self) -> &'static str;

    /// Serializes the wrapped variant struct (not the enum) to JSON.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Store` if serialization fails.
    fn to_payload(&self) -> Result<serde_json::Value, DomainError>;
}

/// Marker for payload kinds published on the command bus.
pub trait CommandKind: PayloadKind {}

/// Marker for payload kinds published on the event queue.
pub trait EventKind: PayloadKind {}

/// One variant of a payload kind `K`.
pub trait Variant<K>: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable type name, identical to `K::type_name` for this variant.
    const TYPE_NAME: &'static str;

    /// Wraps the variant into its kind.
    fn wrap(self) -> K;

    /// Borrows the variant out of a kind, if the kind holds it.
    fn peek(kind: &K) -> Option<&Self>;
}

/// Implements [`PayloadKind`] for an enum and [`Variant`] for each of its
/// single-field tuple variants.
///
/// ```ignore
/// payload_kind!(AccountCommand {
///     Deposit(Deposit) => "account.deposit",
///     Withdraw(Withdraw) => "account.withdraw",
/// });
/// ```
#[macro_export]
macro_rules! payload_kind {
    ($kind:ident { $($variant:ident($payload:ty) => $name:literal),+ $(,)? }) => {
        impl $crate::payload::PayloadKind for $kind {
            fn type_name(&self) -> &'static str {
                match self {
                    $( $kind::$variant(_) => $name, )+
                }
            }

            fn to_payload(
                &self,
            ) -> ::std::result::Result<$crate::__serde_json::Value, $crate::error::DomainError> {
                let value = match self {
                    $( $kind::$variant(inner) => $crate::__serde_json::to_value(inner), )+
                };
                value.map_err(|e| {
                    $crate::error::DomainError::Store(format!("payload serialization failed: {e}"))
                })
            }
        }

        $(
            impl $crate::payload::Variant<$kind> for $payload {
                const TYPE_NAME: &'static str = $name;

                fn wrap(self) -> $kind {
                    $kind::$variant(self)
                }

                #[allow(unreachable_patterns)]
                fn peek(kind: &$kind) -> ::std::option::Option<&Self> {
                    match kind {
                        $kind::$variant(inner) => ::std::option::Option::Some(inner),
                        _ => ::std::option::Option::None,
                    }
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ping {
        count: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Pong;

    #[derive(Debug, Clone, PartialEq)]
    enum Signal {
        Ping(Ping),
        Pong(Pong),
    }

    crate::payload_kind!(Signal {
        Ping(Ping) => "signal.ping",
        Pong(Pong) => "signal.pong",
    });

    #[test]
    fn test_type_name_matches_variant_constant() {
        let signal = Ping { count: 3 }.wrap();

        assert_eq!(signal.type_name(), "signal.ping");
        assert_eq!(signal.type_name(), <Ping as Variant<Signal>>::TYPE_NAME);
        assert_eq!(Signal::Pong(Pong).type_name(), "signal.pong");
    }

    #[test]
    fn test_peek_only_matches_own_variant() {
        let signal = Signal::Ping(Ping { count: 3 });

        assert_eq!(Ping::peek(&signal), Some(&Ping { count: 3 }));
        assert!(Pong::peek(&signal).is_none());
    }

    #[test]
    fn test_to_payload_serializes_inner_struct() {
        let payload = Signal::Ping(Ping { count: 9 }).to_payload().unwrap();

        assert_eq!(payload, serde_json::json!({ "count": 9 }));
    }
}

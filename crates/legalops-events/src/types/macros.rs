/// Generates a closed string enum: the enum itself with exact serde wire
/// names, `ALL`, `as_str`, `Display` and `FromStr`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[doc = $doc:literal])*
                $variant:ident => $wire:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant in definition order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire string.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!(
                        "invalid {}: {other} (expected one of: {})",
                        stringify!($name),
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

/// Generates [`EventType`](crate::types::EventType) and
/// [`DomainEvent`](crate::types::DomainEvent) from one table so the wire
/// name, the tag and the payload type of every event cannot drift apart.
macro_rules! define_domain_events {
    (
        $(
            $(#[doc = $doc:literal])*
            $variant:ident => $wire:literal => $payload_ty:ty
        ),+ $(,)?
    ) => {
        wire_enum! {
            /// Discriminator of the closed domain-event taxonomy.
            EventType {
                $(
                    $(#[doc = $doc])*
                    $variant => $wire
                ),+
            }
        }

        /// A decoded domain event: the tag plus its typed detail object.
        ///
        /// Serializes as the detail object with an added `eventType` key.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "eventType")]
        pub enum DomainEvent {
            $(
                $(#[doc = $doc])*
                #[serde(rename = $wire)]
                $variant($payload_ty),
            )+
        }

        impl DomainEvent {
            /// The event's discriminator.
            #[must_use]
            pub fn event_type(&self) -> EventType {
                match self {
                    $(Self::$variant(_) => EventType::$variant,)+
                }
            }

            /// Decode the detail object delivered for `event`.
            pub fn decode(event: &str, data: &Value) -> EventResult<Self> {
                let event_type: EventType = event
                    .parse()
                    .map_err(|_| EventError::UnknownEventType(event.to_string()))?;
                Ok(match event_type {
                    $(EventType::$variant => Self::$variant(serde_json::from_value(data.clone())?),)+
                })
            }

            /// The detail object as delivered to subscribers (no tag).
            pub fn to_data(&self) -> EventResult<Value> {
                Ok(match self {
                    $(Self::$variant(payload) => serde_json::to_value(payload)?,)+
                })
            }

            /// The payload's `timestamp`.
            #[must_use]
            pub fn timestamp(&self) -> &str {
                match self {
                    $(Self::$variant(payload) => &payload.timestamp,)+
                }
            }
        }
    };
}

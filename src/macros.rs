// Copyright 2024 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Macros for protocol enumerations and service clients.

/// Defines an enumeration of values used on the wire.
///
/// Most values reported by OpenStack and Rackspace are open-ended: vendors add new statuses,
/// algorithms or record types without notice. Such enumerations should be extensible: values
/// unknown to this crate are kept verbatim in the designated variant, survive a round trip and
/// compare equal by their name (case-sensitively, as on the wire).
///
/// ```rust
/// oscloud::protocol_enum! {
///     #[doc = "Condition of a load balancer node."]
///     enum NodeCondition(Other) {
///         Enabled = "ENABLED",
///         Disabled = "DISABLED",
///         Draining = "DRAINING"
///     }
/// }
///
/// let condition: NodeCondition = serde_json::from_str("\"QUARANTINED\"").unwrap();
/// assert_eq!(condition, NodeCondition::Other("QUARANTINED".into()));
/// assert_eq!(condition, "QUARANTINED".parse::<NodeCondition>().unwrap());
/// assert_eq!(condition.as_ref(), "QUARANTINED");
/// assert_eq!(NodeCondition::from("DRAINING"), NodeCondition::Draining);
/// ```
///
/// Values that only flow from the client to the server can be closed: they are `Copy`, and an
/// unknown value fails deserialization.
///
/// ```rust
/// oscloud::protocol_enum! {
///     #[doc = "Kind of a server reboot."]
///     enum RebootType {
///         Soft = "SOFT",
///         Hard = "HARD"
///     }
/// }
///
/// assert!(serde_json::from_str::<RebootType>("\"WARM\"").is_err());
/// ```
///
/// A closed enumeration can use a non-string carrier. With a default variant, unknown values
/// deserialize into it instead of failing:
///
/// ```rust
/// oscloud::protocol_enum! {
///     #[doc = "Power state of a server."]
///     enum PowerState: u8 = NoState {
///         NoState = 0,
///         Running = 1,
///         Paused = 3,
///         Shutdown = 4
///     }
/// }
///
/// assert_eq!(serde_json::from_str::<PowerState>("1").unwrap(), PowerState::Running);
/// assert_eq!(serde_json::from_str::<PowerState>("42").unwrap(), PowerState::NoState);
/// assert_eq!(PowerState::Paused.to_string(), "3");
/// ```
#[macro_export]
macro_rules! protocol_enum {
    {$(#[$attr:meta])* enum $name:ident($other:ident) {
        $($(#[$iattr:meta])* $item:ident = $val:expr),+
    }} => (
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$iattr])* $item),+,
            /// A value that is not known to this library.
            $other(String),
        }

        impl $name {
            /// The value as sent on the wire.
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$item => $val),+,
                    $name::$other(value) => value.as_str(),
                }
            }

            /// Whether the value is not known to this library.
            #[inline]
            pub fn is_unknown(&self) -> bool {
                matches!(self, $name::$other(..))
            }

            fn known(value: &str) -> Option<$name> {
                match value {
                    $($val => Some($name::$item)),+,
                    _ => None,
                }
            }
        }

        impl<'s> From<&'s str> for $name {
            fn from(value: &'s str) -> $name {
                $name::known(value).unwrap_or_else(|| $name::$other(value.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> $name {
                $name::known(&value).unwrap_or($name::$other(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                match value {
                    $name::$other(value) => value,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;

            fn from_str(s: &str) -> ::std::result::Result<$name, Self::Err> {
                Ok($name::from(s))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                <String as ::serde::de::Deserialize>::deserialize(deserializer).map($name::from)
            }
        }

        impl ::serde::ser::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
                    where S: ::serde::ser::Serializer {
                serializer.serialize_str(self.as_str())
            }
        }
    );

    {$(#[$attr:meta])* enum $name:ident {
        $($(#[$iattr:meta])* $item:ident = $val:expr),+
    }} => (
        $crate::protocol_enum! {
            @closed $(#[$attr])* $name: &'static str {
                $($(#[$iattr])* $item = $val),+
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                let value = <String as ::serde::de::Deserialize>::deserialize(deserializer)?;
                match value.as_str() {
                    $($val => Ok($name::$item)),+,
                    other => Err($crate::protocol_enum!(@unexpected D, $name, other)),
                }
            }
        }
    );

    {$(#[$attr:meta])* enum $name:ident: $carrier:ty {
        $($(#[$iattr:meta])* $item:ident = $val:expr),+
    }} => (
        $crate::protocol_enum! {
            @closed $(#[$attr])* $name: $carrier {
                $($(#[$iattr])* $item = $val),+
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                match <$carrier as ::serde::de::Deserialize>::deserialize(deserializer)? {
                    $($val => Ok($name::$item)),+,
                    other => Err($crate::protocol_enum!(@unexpected D, $name, other)),
                }
            }
        }
    );

    {$(#[$attr:meta])* enum $name:ident: $carrier:ty = $default:ident {
        $($(#[$iattr:meta])* $item:ident = $val:expr),+
    }} => (
        $crate::protocol_enum! {
            @closed $(#[$attr])* $name: $carrier {
                $($(#[$iattr])* $item = $val),+
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::$default
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                Ok(match <$carrier as ::serde::de::Deserialize>::deserialize(deserializer)? {
                    $($val => $name::$item),+,
                    _ => $name::$default,
                })
            }
        }
    );

    (@unexpected $de:ident, $name:ident, $value:expr) => (
        <$de::Error as ::serde::de::Error>::custom(
            format!("Unexpected {}: {}", stringify!($name), $value)
        )
    );

    {@closed $(#[$attr:meta])* $name:ident: $carrier:ty {
        $($(#[$iattr:meta])* $item:ident = $val:expr),+
    }} => (
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$iattr])* $item),+,
        }

        impl $name {
            /// The value as sent on the wire.
            pub fn value(&self) -> $carrier {
                match self {
                    $($name::$item => $val),+,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.value(), f)
            }
        }

        impl ::serde::ser::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
                    where S: ::serde::ser::Serializer {
                ::serde::ser::Serialize::serialize(&self.value(), serializer)
            }
        }
    );
}

/// Common constructors and accessors of a service client wrapping an `Adapter`.
macro_rules! service_client {
    ($name:ident: $srv:ty = $service:expr) => {
        impl $name {
            /// Create a client using the session.
            ///
            /// The client shares authentication and the endpoint cache with the session.
            pub fn new(session: &$crate::Session) -> $name {
                $name {
                    adapter: session.adapter($service),
                }
            }

            /// Create a client from an existing adapter.
            #[inline]
            pub fn from_adapter(adapter: $crate::Adapter<$srv>) -> $name {
                $name { adapter }
            }

            /// Underlying adapter.
            #[inline]
            pub fn adapter(&self) -> &$crate::Adapter<$srv> {
                &self.adapter
            }

            /// Use the given authentication for requests of this client.
            #[inline]
            pub fn with_auth_type<Auth: $crate::AuthType + 'static>(self, auth_type: Auth) -> $name {
                $name {
                    adapter: self.adapter.with_auth_type(auth_type),
                }
            }

            /// Use the given endpoint interface for requests of this client.
            #[inline]
            pub fn with_endpoint_interface(self, interface: $crate::InterfaceType) -> $name {
                $name {
                    adapter: self.adapter.with_endpoint_interface(interface),
                }
            }

            /// Use the given region for requests of this client.
            #[inline]
            pub fn with_region<T: Into<String>>(self, region: T) -> $name {
                $name {
                    adapter: self.adapter.with_region(region),
                }
            }
        }
    };
}

#[cfg(test)]
pub mod test {
    use crate::protocol_enum;

    protocol_enum! {
        enum RecordType(Other) {
            A = "A",
            Aaaa = "AAAA",
            Cname = "CNAME",
            Mx = "MX"
        }
    }

    #[test]
    fn test_extensible_known() {
        assert_eq!(RecordType::Aaaa.as_str(), "AAAA");
        assert_eq!(RecordType::Mx.to_string(), "MX");
        assert_eq!(
            serde_json::from_str::<RecordType>("\"CNAME\"").unwrap(),
            RecordType::Cname
        );
        assert_eq!(serde_json::to_string(&RecordType::A).unwrap(), "\"A\"");
        assert_eq!(RecordType::from(String::from("MX")), RecordType::Mx);
        assert!(!RecordType::A.is_unknown());
    }

    #[test]
    fn test_extensible_unknown() {
        let value: RecordType = serde_json::from_str("\"SRV\"").unwrap();
        assert!(value.is_unknown());
        assert_eq!(value, RecordType::Other("SRV".into()));
        assert_eq!(value, "SRV".parse::<RecordType>().unwrap());
        assert_ne!(value, RecordType::from("srv"));
        assert_ne!(RecordType::from("mx"), RecordType::Mx);
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"SRV\"");
        assert_eq!(String::from(value), "SRV");
        assert!(serde_json::from_str::<RecordType>("42").is_err());
    }

    protocol_enum! {
        enum Protocol {
            Http = "HTTP",
            Https = "HTTPS"
        }
    }

    #[test]
    fn test_closed() {
        assert_eq!(Protocol::Https.value(), "HTTPS");
        assert_eq!(Protocol::Http.to_string(), "HTTP");
        assert_eq!(
            serde_json::from_str::<Protocol>("\"HTTPS\"").unwrap(),
            Protocol::Https
        );
        assert_eq!(serde_json::to_string(&Protocol::Http).unwrap(), "\"HTTP\"");
        let err = serde_json::from_str::<Protocol>("\"FTP\"").unwrap_err();
        assert!(err.to_string().contains("Unexpected Protocol: FTP"));
    }

    protocol_enum! {
        enum Version: u8 {
            V4 = 4,
            V6 = 6
        }
    }

    protocol_enum! {
        enum PowerState: u8 = NoState {
            NoState = 0,
            Running = 1,
            Shutdown = 4
        }
    }

    #[test]
    fn test_carrier() {
        assert_eq!(Version::V6.value(), 6);
        assert_eq!(Version::V4.to_string(), "4");
        assert_eq!(serde_json::from_str::<Version>("6").unwrap(), Version::V6);
        assert_eq!(serde_json::to_string(&Version::V4).unwrap(), "4");
        assert!(serde_json::from_str::<Version>("5").is_err());
        assert!(serde_json::from_str::<Version>("\"4\"").is_err());

        assert_eq!(PowerState::default(), PowerState::NoState);
        assert_eq!(
            serde_json::from_str::<PowerState>("4").unwrap(),
            PowerState::Shutdown
        );
        assert_eq!(
            serde_json::from_str::<PowerState>("7").unwrap(),
            PowerState::NoState
        );
        assert!(serde_json::from_str::<PowerState>("\"running\"").is_err());
    }
}

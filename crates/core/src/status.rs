//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table, and its name matches
//! the seeded `name` column.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant in discriminant order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Return the seeded status name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Resolve a database status ID, if known.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Resolve a status name, if known.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $label => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Assembly lifecycle status.
    AssemblyStatus {
        Draft = 1 => "draft",
        InReview = 2 => "in_review",
        Approved = 3 => "approved",
        RegistrationOpen = 4 => "registration_open",
        RegistrationClosed = 5 => "registration_closed",
        Completed = 6 => "completed",
        Archived = 7 => "archived",
    }
}

define_status_enum! {
    /// Invite batch dispatch status.
    InviteBatchStatus {
        Draft = 1 => "draft",
        Dispatched = 2 => "dispatched",
    }
}

define_status_enum! {
    /// Individual invite status.
    InviteStatus {
        Pending = 1 => "pending",
        Dispatched = 2 => "dispatched",
        Responded = 3 => "responded",
    }
}

define_status_enum! {
    /// Whether a registrant is still taking part.
    RegistrationStatus {
        Registered = 1 => "registered",
        Withdrawn = 2 => "withdrawn",
    }
}

define_status_enum! {
    /// Whether a registrant has been drawn by a selection run.
    SelectionStatus {
        Pool = 1 => "pool",
        Selected = 2 => "selected",
    }
}

define_status_enum! {
    /// Attendance confirmation state, driven by confirmation calls.
    ConfirmationStatus {
        Unconfirmed = 1 => "unconfirmed",
        Attempted = 2 => "attempted",
        Confirmed = 3 => "confirmed",
        Declined = 4 => "declined",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_status_ids_match_seed_data() {
        assert_eq!(AssemblyStatus::Draft.id(), 1);
        assert_eq!(AssemblyStatus::InReview.id(), 2);
        assert_eq!(AssemblyStatus::Approved.id(), 3);
        assert_eq!(AssemblyStatus::RegistrationOpen.id(), 4);
        assert_eq!(AssemblyStatus::RegistrationClosed.id(), 5);
        assert_eq!(AssemblyStatus::Completed.id(), 6);
        assert_eq!(AssemblyStatus::Archived.id(), 7);
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = ConfirmationStatus::Confirmed.into();
        assert_eq!(id, 3);
    }

    #[test]
    fn from_id_and_name_round_trip() {
        for status in AssemblyStatus::ALL {
            assert_eq!(AssemblyStatus::from_id(status.id()), Some(*status));
            assert_eq!(AssemblyStatus::from_name(status.as_str()), Some(*status));
        }
        assert_eq!(SelectionStatus::from_id(9), None);
        assert_eq!(InviteStatus::from_name("lost"), None);
    }

    #[test]
    fn display_uses_seed_name() {
        assert_eq!(RegistrationStatus::Withdrawn.to_string(), "withdrawn");
    }
}

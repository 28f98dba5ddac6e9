//! Static role table.
//!
//! Nine roles exist; a five-seat game deals [`FIVE_PLAYER_ROLES`].

use serde::{Deserialize, Serialize};

/// Side a role plays for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    Good,
    Evil,
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alignment::Good => write!(f, "Good"),
            Alignment::Evil => write!(f, "Evil"),
        }
    }
}

/// Every role identity the catalog knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Merlin,
    Percival,
    LoyalServant,
    Morgana,
    Assassin,
    Mordred,
    Oberon,
    MinionOfMordred,
}

/// The role set dealt at a five-seat table.
pub const FIVE_PLAYER_ROLES: [Role; 5] = [
    Role::Merlin,
    Role::Percival,
    Role::LoyalServant,
    Role::Morgana,
    Role::Assassin,
];

/// Descriptive entry for a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleDetail {
    pub name: &'static str,
    pub alignment: Alignment,
    /// Has a special power (as opposed to alignment only).
    pub active: bool,
    pub description: &'static str,
    pub long_description: &'static str,
}

impl RoleDetail {
    /// How the role is shown to its holder: active roles by name, plain
    /// roles by alignment.
    #[must_use]
    pub fn display_label(&self) -> String {
        if self.active {
            self.name.to_string()
        } else {
            self.alignment.to_string()
        }
    }
}

/// Placeholder entry shown before roles are dealt.
pub const UNKNOWN_ROLE: RoleDetail = RoleDetail {
    name: "Unknown",
    alignment: Alignment::Good,
    active: false,
    description: "Role not yet assigned",
    long_description: "Your destiny will soon be revealed.",
};

impl Role {
    /// All catalog roles.
    pub const ALL: [Role; 8] = [
        Role::Merlin,
        Role::Percival,
        Role::LoyalServant,
        Role::Morgana,
        Role::Assassin,
        Role::Mordred,
        Role::Oberon,
        Role::MinionOfMordred,
    ];

    #[must_use]
    pub const fn alignment(self) -> Alignment {
        match self {
            Role::Merlin | Role::Percival | Role::LoyalServant => Alignment::Good,
            Role::Morgana | Role::Assassin | Role::Mordred | Role::Oberon | Role::MinionOfMordred => {
                Alignment::Evil
            }
        }
    }

    #[must_use]
    pub const fn is_good(self) -> bool {
        matches!(self.alignment(), Alignment::Good)
    }

    /// Invisible to Merlin's sight.
    #[must_use]
    pub const fn hidden_from_merlin(self) -> bool {
        matches!(self, Role::Mordred)
    }

    /// Neither sees nor is seen by the rest of Evil.
    #[must_use]
    pub const fn hidden_from_evil(self) -> bool {
        matches!(self, Role::Oberon)
    }

    /// Merlin or Morgana: the pair Percival cannot tell apart.
    #[must_use]
    pub const fn is_percival_pair(self) -> bool {
        matches!(self, Role::Merlin | Role::Morgana)
    }

    #[must_use]
    pub const fn detail(self) -> RoleDetail {
        match self {
            Role::Merlin => RoleDetail {
                name: "Merlin",
                alignment: Alignment::Good,
                active: true,
                description: "Sees Evil (except Mordred)",
                long_description: "You know who is Evil, but they must not discover you. Mordred is hidden from your sight.",
            },
            Role::Percival => RoleDetail {
                name: "Percival",
                alignment: Alignment::Good,
                active: true,
                description: "Sees Merlin & Morgana",
                long_description: "You see Merlin and Morgana, but do not know which is which.",
            },
            Role::LoyalServant => RoleDetail {
                name: "Loyal Servant of Arthur",
                alignment: Alignment::Good,
                active: false,
                description: "Servant of Good",
                long_description: "Uphold the light and identify your allies!",
            },
            Role::Morgana => RoleDetail {
                name: "Morgana",
                alignment: Alignment::Evil,
                active: true,
                description: "Appears as Merlin to Percival",
                long_description: "You appear as Merlin to Percival. Deceive him to protect your Evil comrades.",
            },
            Role::Assassin => RoleDetail {
                name: "Assassin",
                alignment: Alignment::Evil,
                active: true,
                description: "Can assassinate Merlin",
                long_description: "If Good wins 3 quests, you have one chance to identify and assassinate Merlin.",
            },
            Role::Mordred => RoleDetail {
                name: "Mordred",
                alignment: Alignment::Evil,
                active: true,
                description: "Unknown to Merlin",
                long_description: "Merlin does not know your identity. Lead the forces of Evil from the shadows.",
            },
            Role::Oberon => RoleDetail {
                name: "Oberon",
                alignment: Alignment::Evil,
                active: true,
                description: "Unknown to other Evil",
                long_description: "You are Evil, but do not know your fellow Minions of Mordred, and they do not know you.",
            },
            Role::MinionOfMordred => RoleDetail {
                name: "Minion of Mordred",
                alignment: Alignment::Evil,
                active: false,
                description: "Servant of Evil",
                long_description: "Work with your allies to sabotage quests and ensure Evil prevails!",
            },
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.detail().name)
    }
}

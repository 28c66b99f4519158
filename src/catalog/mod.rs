// Role and permission catalog - static role -> permission mapping
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Platform roles ordered by privilege. Serialized as the wire-level
/// SCREAMING_SNAKE_CASE tokens; unknown role strings fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    IndividualUser,
    CompanyUser,
    CompanyManager,
    CompanyAdmin,
    SuperAdmin,
}

impl Role {
    /// Privilege rank used for every "at least as privileged as" comparison.
    /// Higher rank may manage lower rank, never a peer or superior.
    pub fn rank(&self) -> u8 {
        match self {
            Role::IndividualUser => 0,
            Role::CompanyUser => 1,
            Role::CompanyManager => 2,
            Role::CompanyAdmin => 3,
            Role::SuperAdmin => 4,
        }
    }

    /// Company roles only exist inside a tenant; assigning one requires a
    /// matching company scope on the assigner.
    pub fn is_company_role(&self) -> bool {
        matches!(
            self,
            Role::CompanyUser | Role::CompanyManager | Role::CompanyAdmin
        )
    }

    pub fn all() -> &'static [Role] {
        &[
            Role::IndividualUser,
            Role::CompanyUser,
            Role::CompanyManager,
            Role::CompanyAdmin,
            Role::SuperAdmin,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::IndividualUser => "Individual User",
            Role::CompanyUser => "Company User",
            Role::CompanyManager => "Company Manager",
            Role::CompanyAdmin => "Company Admin",
            Role::SuperAdmin => "Super Admin",
        }
    }
}

/// Fine-grained capability tokens. The engine never inspects these beyond
/// equality; the string forms exist only for serialization and audit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Platform administration
    ManagePlatform,
    ManageCompanies,
    ViewPlatformAnalytics,

    // Company administration
    ManageCompany,
    ManageCompanyUsers,
    ViewCompanyAnalytics,
    ViewCompanyData,

    // Personal data
    ViewOwnData,
    CreateJournal,
    TrackMood,
    ViewWellnessInsights,
    ManageProfile,
    DeleteAccount,
}

impl Permission {
    pub fn all() -> &'static [Permission] {
        &[
            Permission::ManagePlatform,
            Permission::ManageCompanies,
            Permission::ViewPlatformAnalytics,
            Permission::ManageCompany,
            Permission::ManageCompanyUsers,
            Permission::ViewCompanyAnalytics,
            Permission::ViewCompanyData,
            Permission::ViewOwnData,
            Permission::CreateJournal,
            Permission::TrackMood,
            Permission::ViewWellnessInsights,
            Permission::ManageProfile,
            Permission::DeleteAccount,
        ]
    }
}

/// Personal capabilities every authenticated user gets regardless of role.
fn base_permissions() -> BTreeSet<Permission> {
    BTreeSet::from([
        Permission::ViewOwnData,
        Permission::CreateJournal,
        Permission::TrackMood,
        Permission::ViewWellnessInsights,
        Permission::ManageProfile,
        Permission::DeleteAccount,
    ])
}

static ROLE_PERMISSIONS: Lazy<BTreeMap<Role, BTreeSet<Permission>>> = Lazy::new(|| {
    let mut map = BTreeMap::new();

    map.insert(Role::IndividualUser, base_permissions());
    map.insert(Role::CompanyUser, base_permissions());

    let mut manager = base_permissions();
    manager.extend([
        Permission::ManageCompanyUsers,
        Permission::ViewCompanyAnalytics,
        Permission::ViewCompanyData,
    ]);
    map.insert(Role::CompanyManager, manager);

    let mut admin = base_permissions();
    admin.extend([
        Permission::ManageCompany,
        Permission::ManageCompanyUsers,
        Permission::ViewCompanyAnalytics,
        Permission::ViewCompanyData,
    ]);
    map.insert(Role::CompanyAdmin, admin);

    // Super admins hold the full catalog
    map.insert(Role::SuperAdmin, Permission::all().iter().copied().collect());

    map
});

/// Default permission set for a role. Total over the enum: every role has a
/// defined, non-empty set.
pub fn role_permissions(role: Role) -> &'static BTreeSet<Permission> {
    ROLE_PERMISSIONS
        .get(&role)
        .unwrap_or_else(|| unreachable!("catalog covers every role variant"))
}

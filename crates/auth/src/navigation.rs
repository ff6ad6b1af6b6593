//! Role-filtered navigation menu.

use serde::Serialize;

use crate::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub title: &'static str,
    pub url: &'static str,
    pub roles: &'static [Role],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavSection {
    pub title: &'static str,
    pub url: Option<&'static str>,
    pub roles: &'static [Role],
    pub items: Vec<NavItem>,
}

const EVERYONE: &[Role] = &[Role::Staff, Role::Approver, Role::Finance, Role::Admin];
const REVIEWERS: &[Role] = &[Role::Approver, Role::Finance, Role::Admin];

/// The complete, unfiltered menu.
pub fn full_menu() -> Vec<NavSection> {
    vec![
        NavSection {
            title: "Claims",
            url: Some("/claims"),
            roles: EVERYONE,
            items: vec![
                NavItem { title: "Create New Claim", url: "/create-claim", roles: &[Role::Staff] },
                NavItem { title: "View Personal Claims", url: "/claims", roles: EVERYONE },
            ],
        },
        NavSection {
            title: "Management",
            url: None,
            roles: REVIEWERS,
            items: vec![
                NavItem { title: "Claim Control", url: "/claims?viewMode=ApproverMode", roles: &[Role::Approver] },
                NavItem { title: "Claim Control", url: "/claims?viewMode=FinanceMode", roles: &[Role::Finance] },
                NavItem { title: "Claim Control", url: "/claims?viewMode=AdminMode", roles: &[Role::Admin] },
            ],
        },
        NavSection {
            title: "Admin Center",
            url: None,
            roles: &[Role::Admin],
            items: vec![
                NavItem { title: "Manage Staff", url: "/admin/staffs", roles: &[Role::Admin] },
                NavItem { title: "Manage Project", url: "/admin/projects", roles: &[Role::Admin] },
            ],
        },
    ]
}

/// Sections and items visible to `role`; `None` (unknown role) sees nothing.
pub fn menu_for(role: Option<Role>) -> Vec<NavSection> {
    let Some(role) = role else {
        return Vec::new();
    };

    full_menu()
        .into_iter()
        .filter(|section| section.roles.contains(&role))
        .map(|mut section| {
            section.items.retain(|item| item.roles.contains(&role));
            section
        })
        .collect()
}

//! Role gating. Each view is reachable by a fixed set of roles; everybody
//! else is redirected, either to the login view or to their own dashboard.

use std::fmt;

use ethers::types::Address;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Institution,
    Student,
    Verifier,
}

impl Role {
    pub fn can_issue(&self) -> bool {
        matches!(self, Role::Admin | Role::Institution)
    }

    /// where a signed-in user of this role lands
    pub fn dashboard(&self) -> View {
        match self {
            Role::Admin => View::AdminDashboard,
            Role::Institution => View::InstitutionDashboard,
            Role::Student => View::StudentDashboard,
            Role::Verifier => View::VerifyCredential,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Institution => "institution",
            Role::Student => "student",
            Role::Verifier => "verifier",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    Home,
    Login,
    AdminDashboard,
    InstitutionDashboard,
    IssueCredential,
    StudentDashboard,
    VerifyCredential,
}

const ROUTES: &[(&str, View)] = &[
    ("/", View::Home),
    ("/login", View::Login),
    ("/admin", View::AdminDashboard),
    ("/institution", View::InstitutionDashboard),
    ("/institution/issue", View::IssueCredential),
    ("/student", View::StudentDashboard),
    ("/verify", View::VerifyCredential),
];

impl View {
    pub fn from_path(path: &str) -> Option<View> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        ROUTES.iter().find(|(p, _)| *p == path).map(|(_, v)| *v)
    }

    pub fn path(&self) -> &'static str {
        ROUTES
            .iter()
            .find(|(_, v)| *v == *self)
            .map(|(p, _)| *p)
            .unwrap_or("/")
    }

    /// roles allowed in, `None` for public views
    fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            View::Home | View::Login | View::VerifyCredential => None,
            View::AdminDashboard => Some(&[Role::Admin]),
            View::InstitutionDashboard | View::IssueCredential => {
                Some(&[Role::Institution, Role::Admin])
            }
            View::StudentDashboard => Some(&[Role::Student]),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionUser {
    pub display_name: String,
    pub address: Address,
    pub role: Role,
}

/// The signed-in user, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<SessionUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, user: SessionUser) {
        log::info!("{} signed in as {}", user.display_name, user.role);
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(View),
}

pub fn authorize(session: &Session, view: View) -> Access {
    let Some(allowed) = view.allowed_roles() else {
        return Access::Granted;
    };

    match session.role() {
        None => Access::Redirect(View::Login),
        Some(role) if allowed.contains(&role) => Access::Granted,
        Some(role) => Access::Redirect(role.dashboard()),
    }
}

use crate::session::{AuthContext, Role};
use serde::Serialize;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Login,
    Dashboard,
    Students,
    StudentNew,
    StudentDetail,
    Attendance,
    Grades,
    GradesEntry,
    Payments,
    Behavior,
    Activities,
    Staff,
    NonWorkingDays,
}

#[derive(Debug, Clone, Copy)]
pub enum Access {
    Public,
    All,
    Roles(&'static [Role]),
}

impl Access {
    pub fn allows(self, role: Option<Role>) -> bool {
        match self {
            Access::Public | Access::All => true,
            Access::Roles(roles) => role.map(|r| roles.contains(&r)).unwrap_or(false),
        }
    }
}

const STUDENTS_ROLES: &[Role] = &[
    Role::Admin,
    Role::Secretaria,
    Role::Docente,
    Role::Preceptor,
    Role::Tesoreria,
];
const ATTENDANCE_ROLES: &[Role] = &[Role::Admin, Role::Secretaria, Role::Preceptor, Role::Docente];
const GRADES_ROLES: &[Role] = &[Role::Admin, Role::Secretaria, Role::Docente];
const BEHAVIOR_ROLES: &[Role] = &[Role::Admin, Role::Secretaria, Role::Preceptor, Role::Docente];
const PAYMENTS_ROLES: &[Role] = &[Role::Admin, Role::Secretaria, Role::Tesoreria];
const ACTIVITIES_ROLES: &[Role] = &[Role::Admin, Role::Secretaria, Role::Docente];
const STAFF_ROLES: &[Role] = &[Role::Admin, Role::Secretaria];
const CALENDAR_ROLES: &[Role] = &[Role::Admin, Role::Secretaria];

impl Screen {
    pub fn access(self) -> Access {
        match self {
            Screen::Login => Access::Public,
            Screen::Dashboard => Access::All,
            Screen::Students | Screen::StudentNew | Screen::StudentDetail => {
                Access::Roles(STUDENTS_ROLES)
            }
            Screen::Attendance => Access::Roles(ATTENDANCE_ROLES),
            Screen::Grades | Screen::GradesEntry => Access::Roles(GRADES_ROLES),
            Screen::Payments => Access::Roles(PAYMENTS_ROLES),
            Screen::Behavior => Access::Roles(BEHAVIOR_ROLES),
            Screen::Activities => Access::Roles(ACTIVITIES_ROLES),
            Screen::Staff => Access::Roles(STAFF_ROLES),
            Screen::NonWorkingDays => Access::Roles(CALENDAR_ROLES),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    #[serde(skip)]
    pub screen: Screen,
}

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem { label: "Dashboard", path: "/dashboard", screen: Screen::Dashboard },
    NavItem { label: "Alumnos", path: "/alumnos", screen: Screen::Students },
    NavItem { label: "Asistencias", path: "/asistencias", screen: Screen::Attendance },
    NavItem { label: "Notas", path: "/notas", screen: Screen::Grades },
    NavItem { label: "Conducta", path: "/conducta", screen: Screen::Behavior },
    NavItem { label: "Pagos", path: "/pagos", screen: Screen::Payments },
    NavItem { label: "Actividades", path: "/actividades", screen: Screen::Activities },
    NavItem { label: "Personal", path: "/personal", screen: Screen::Staff },
    NavItem { label: "Días Inhábiles", path: "/dias-inhabiles", screen: Screen::NonWorkingDays },
];

/// Menu entries the given role may see.
pub fn visible_nav(role: Option<Role>) -> Vec<&'static NavItem> {
    NAV_ITEMS
        .iter()
        .filter(|item| item.screen.access().allows(role))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Screen(Screen),
    /// `/alumnos/:id`
    StudentDetail(String),
    Redirect(&'static str),
}

pub fn resolve(path: &str) -> Option<Route> {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    let route = match trimmed {
        "" => Route::Redirect(HOME_PATH),
        "/login" => Route::Screen(Screen::Login),
        "/dashboard" => Route::Screen(Screen::Dashboard),
        "/alumnos" => Route::Screen(Screen::Students),
        "/alumnos/nuevo" => Route::Screen(Screen::StudentNew),
        "/asistencias" => Route::Screen(Screen::Attendance),
        "/notas" => Route::Screen(Screen::Grades),
        "/notas/carga" => Route::Screen(Screen::GradesEntry),
        "/pagos" => Route::Screen(Screen::Payments),
        "/conducta" => Route::Screen(Screen::Behavior),
        "/actividades" => Route::Screen(Screen::Activities),
        "/personal" => Route::Screen(Screen::Staff),
        "/dias-inhabiles" => Route::Screen(Screen::NonWorkingDays),
        other => {
            let id = other.strip_prefix("/alumnos/")?;
            if id.is_empty() || id.contains('/') {
                return None;
            }
            Route::StudentDetail(id.to_string())
        }
    };
    Some(route)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Loading,
    Redirect(&'static str),
    Forbidden,
    Render(Screen),
}

/// Decides what the shell shows for `screen` given the current auth state.
pub fn check(screen: Screen, auth: &AuthContext) -> GuardOutcome {
    let access = screen.access();
    if matches!(access, Access::Public) {
        return GuardOutcome::Render(screen);
    }
    if auth.is_loading() {
        return GuardOutcome::Loading;
    }
    if auth.session().is_none() {
        return GuardOutcome::Redirect(LOGIN_PATH);
    }
    if !access.allows(auth.role()) {
        return GuardOutcome::Forbidden;
    }
    GuardOutcome::Render(screen)
}

pub fn check_path(path: &str, auth: &AuthContext) -> Option<GuardOutcome> {
    match resolve(path)? {
        Route::Redirect(to) => Some(GuardOutcome::Redirect(to)),
        Route::Screen(screen) => Some(check(screen, auth)),
        Route::StudentDetail(_) => Some(check(Screen::StudentDetail, auth)),
    }
}

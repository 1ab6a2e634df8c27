use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewAvailability,
    BookAppointment,
    ManageAppointments,
    ViewAllAppointments,
    ManageUsers,
}

const STAFF: &[Role] = &[Role::Admin, Role::Veterinarian, Role::Receptionist];
const EVERYONE: &[Role] = &[
    Role::Admin,
    Role::Veterinarian,
    Role::Receptionist,
    Role::Customer,
];

/// Role-access table.
const ACCESS: &[(Action, &[Role])] = &[
    (Action::ViewAvailability, EVERYONE),
    (Action::BookAppointment, EVERYONE),
    (Action::ManageAppointments, STAFF),
    (Action::ViewAllAppointments, STAFF),
    (Action::ManageUsers, &[Role::Admin]),
];

pub fn can(role: Role, action: Action) -> bool {
    ACCESS
        .iter()
        .find(|(a, _)| *a == action)
        .map(|(_, roles)| roles.contains(&role))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customers_can_view_and_book() {
        assert!(can(Role::Customer, Action::ViewAvailability));
        assert!(can(Role::Customer, Action::BookAppointment));
        assert!(!can(Role::Customer, Action::ManageAppointments));
        assert!(!can(Role::Customer, Action::ViewAllAppointments));
    }

    #[test]
    fn test_staff_permissions() {
        assert!(can(Role::Receptionist, Action::ManageAppointments));
        assert!(can(Role::Veterinarian, Action::ViewAllAppointments));
        assert!(!can(Role::Veterinarian, Action::ManageUsers));
        assert!(can(Role::Admin, Action::ManageUsers));
    }
}

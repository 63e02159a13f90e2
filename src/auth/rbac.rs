//! Role to permission mapping.
//!
//! Permissions are `area:action` strings. A grant of `area:*` covers every
//! action in the area and `*` covers everything.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::entities::empleado::Rol;

/// Role definition with associated permissions
#[derive(Debug, Clone)]
pub struct Role {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: Vec<&'static str>,
}

pub mod consts {
    pub const EMPLEADOS_READ: &str = "empleados:read";
    pub const EMPLEADOS_MANAGE: &str = "empleados:manage";
    pub const ASISTENCIA_READ: &str = "asistencia:read";
    pub const ASISTENCIA_WRITE: &str = "asistencia:write";
    pub const ASISTENCIA_VALIDATE: &str = "asistencia:validate";
    pub const TURNOS_READ: &str = "turnos:read";
    pub const TURNOS_MANAGE: &str = "turnos:manage";
    pub const SOLICITUDES_READ: &str = "solicitudes:read";
    pub const SOLICITUDES_CREATE: &str = "solicitudes:create";
    pub const SOLICITUDES_APPROVE: &str = "solicitudes:approve";
    pub const TIPOS_SOLICITUD_MANAGE: &str = "solicitudes:manage_tipos";
    pub const NOTIFICACIONES_READ: &str = "notificaciones:read";
    pub const TAREAS_READ: &str = "tareas:read";
    pub const TAREAS_WRITE: &str = "tareas:write";
    pub const INVENTARIO_READ: &str = "inventario:read";
    pub const INVENTARIO_WRITE: &str = "inventario:write";
    pub const PROVEEDORES_READ: &str = "proveedores:read";
    pub const PROVEEDORES_WRITE: &str = "proveedores:write";
    pub const ORDENES_READ: &str = "ordenes:read";
    pub const ORDENES_WRITE: &str = "ordenes:write";
    pub const ORDENES_APPROVE: &str = "ordenes:approve";
    pub const CONFIGURACION_READ: &str = "configuracion:read";
    pub const CONFIGURACION_MANAGE: &str = "configuracion:manage";
    pub const REPORTES_GENERATE: &str = "reportes:generate";
    pub const REPORTES_READ: &str = "reportes:read";
    pub const AUDITORIA_READ: &str = "auditoria:read";
    pub const DASHBOARD_READ: &str = "dashboard:read";
}

lazy_static! {
    pub static ref ROLES: HashMap<Rol, Role> = {
        let mut roles = HashMap::new();

        roles.insert(
            Rol::Gerente,
            Role {
                name: "gerente",
                description: "Full access, including reports and the dashboard",
                permissions: vec!["*"],
            },
        );

        roles.insert(
            Rol::Administrador,
            Role {
                name: "administrador",
                description: "Runs day-to-day operations",
                permissions: vec![
                    "empleados:*",
                    "asistencia:*",
                    "turnos:*",
                    "solicitudes:*",
                    "notificaciones:*",
                    "tareas:*",
                    "inventario:*",
                    "proveedores:*",
                    "ordenes:*",
                    "configuracion:*",
                    "auditoria:read",
                ],
            },
        );

        roles.insert(
            Rol::Empleado,
            Role {
                name: "empleado",
                description: "Staff member working on their own records",
                permissions: vec![
                    "asistencia:read",
                    "asistencia:write",
                    "turnos:read",
                    "solicitudes:read",
                    "solicitudes:create",
                    "notificaciones:read",
                    "tareas:read",
                    "tareas:write",
                    "inventario:read",
                    "inventario:write",
                    "proveedores:read",
                    "ordenes:read",
                ],
            },
        );

        roles
    };
}

/// Check if a granted permission covers a required one
pub fn check_permission(granted: &str, required: &str) -> bool {
    if granted == "*" || granted == required {
        return true;
    }

    match granted.strip_suffix(":*") {
        Some(area) => required
            .split_once(':')
            .map_or(false, |(required_area, _)| required_area == area),
        None => false,
    }
}

pub fn role_has_permission(rol: Rol, required: &str) -> bool {
    ROLES
        .get(&rol)
        .map_or(false, |role| {
            role.permissions
                .iter()
                .any(|granted| check_permission(granted, required))
        })
}

#[cfg(test)]
mod tests {
    use super::consts::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*", "reportes:generate", true)]
    #[case("inventario:*", "inventario:write", true)]
    #[case("inventario:*", "inventariox:write", false)]
    #[case("tareas:read", "tareas:read", true)]
    #[case("tareas:read", "tareas:write", false)]
    fn wildcard_matching(#[case] granted: &str, #[case] required: &str, #[case] expected: bool) {
        assert_eq!(check_permission(granted, required), expected);
    }

    #[rstest]
    #[case(Rol::Gerente, DASHBOARD_READ, true)]
    #[case(Rol::Gerente, REPORTES_GENERATE, true)]
    #[case(Rol::Administrador, EMPLEADOS_MANAGE, true)]
    #[case(Rol::Administrador, ORDENES_APPROVE, true)]
    #[case(Rol::Administrador, DASHBOARD_READ, false)]
    #[case(Rol::Administrador, REPORTES_READ, false)]
    #[case(Rol::Empleado, INVENTARIO_WRITE, true)]
    #[case(Rol::Empleado, SOLICITUDES_CREATE, true)]
    #[case(Rol::Empleado, SOLICITUDES_APPROVE, false)]
    #[case(Rol::Empleado, EMPLEADOS_READ, false)]
    #[case(Rol::Empleado, PROVEEDORES_WRITE, false)]
    #[case(Rol::Empleado, CONFIGURACION_READ, false)]
    #[case(Rol::Empleado, ASISTENCIA_VALIDATE, false)]
    fn role_table(#[case] rol: Rol, #[case] permission: &str, #[case] expected: bool) {
        assert_eq!(role_has_permission(rol, permission), expected);
    }
}

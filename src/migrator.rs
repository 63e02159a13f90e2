use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_empleados_table::Migration),
            Box::new(m20240101_000002_create_asistencias_table::Migration),
            Box::new(m20240101_000003_create_turnos_tables::Migration),
            Box::new(m20240101_000004_create_solicitudes_tables::Migration),
            Box::new(m20240101_000005_create_notificaciones_table::Migration),
            Box::new(m20240101_000006_create_tareas_tables::Migration),
            Box::new(m20240101_000007_create_inventario_table::Migration),
            Box::new(m20240101_000008_create_compras_tables::Migration),
            Box::new(m20240101_000009_create_sistema_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_empleados_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_empleados_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Empleados::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Empleados::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Empleados::Rut)
                                .string_len(12)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Empleados::Nombre).string_len(100).not_null())
                        .col(ColumnDef::new(Empleados::Apellido).string_len(100).not_null())
                        .col(ColumnDef::new(Empleados::Correo).string_len(254).null())
                        .col(ColumnDef::new(Empleados::Celular).string_len(20).null())
                        .col(ColumnDef::new(Empleados::FechaNacimiento).date().null())
                        .col(ColumnDef::new(Empleados::Direccion).text().null())
                        .col(ColumnDef::new(Empleados::Cargo).string_len(100).not_null())
                        .col(ColumnDef::new(Empleados::Departamento).string_len(100).null())
                        .col(ColumnDef::new(Empleados::FechaContratacion).date().not_null())
                        .col(ColumnDef::new(Empleados::FechaTermino).date().null())
                        .col(ColumnDef::new(Empleados::Salario).big_integer().null())
                        .col(ColumnDef::new(Empleados::TipoContrato).string_len(20).not_null())
                        .col(ColumnDef::new(Empleados::Estado).string_len(20).not_null())
                        .col(ColumnDef::new(Empleados::Rol).string_len(20).not_null())
                        .col(ColumnDef::new(Empleados::Password).string_len(255).null())
                        .col(ColumnDef::new(Empleados::FotoPerfil).string_len(255).null())
                        .col(ColumnDef::new(Empleados::Observaciones).text().null())
                        .col(
                            ColumnDef::new(Empleados::Activo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Empleados::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Empleados::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_empleados_estado")
                        .table(Empleados::Table)
                        .col(Empleados::Estado)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Empleados::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Empleados {
        Table,
        Id,
        Rut,
        Nombre,
        Apellido,
        Correo,
        Celular,
        FechaNacimiento,
        Direccion,
        Cargo,
        Departamento,
        FechaContratacion,
        FechaTermino,
        Salario,
        TipoContrato,
        Estado,
        Rol,
        Password,
        FotoPerfil,
        Observaciones,
        Activo,
        FechaCreacion,
        FechaActualizacion,
    }
}

mod m20240101_000002_create_asistencias_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_asistencias_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Asistencias::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Asistencias::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Asistencias::EmpleadoRut).string_len(12).not_null())
                        .col(ColumnDef::new(Asistencias::Fecha).date().not_null())
                        .col(
                            ColumnDef::new(Asistencias::HoraEntrada)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Asistencias::HoraSalida)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Asistencias::TipoEntrada).string_len(20).not_null())
                        .col(ColumnDef::new(Asistencias::TipoSalida).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Asistencias::MinutosTarde)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Asistencias::MinutosExtras)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Asistencias::HorasTrabajadas)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(Asistencias::Estado).string_len(20).not_null())
                        .col(ColumnDef::new(Asistencias::Observaciones).text().null())
                        .col(ColumnDef::new(Asistencias::UbicacionEntrada).string_len(255).null())
                        .col(ColumnDef::new(Asistencias::UbicacionSalida).string_len(255).null())
                        .col(ColumnDef::new(Asistencias::IpEntrada).string_len(45).null())
                        .col(ColumnDef::new(Asistencias::IpSalida).string_len(45).null())
                        .col(ColumnDef::new(Asistencias::ValidadoPor).integer().null())
                        .col(
                            ColumnDef::new(Asistencias::FechaValidacion)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Asistencias::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Asistencias::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_asistencias_empleado_fecha")
                        .table(Asistencias::Table)
                        .col(Asistencias::EmpleadoRut)
                        .col(Asistencias::Fecha)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_asistencias_fecha")
                        .table(Asistencias::Table)
                        .col(Asistencias::Fecha)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Asistencias::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Asistencias {
        Table,
        Id,
        EmpleadoRut,
        Fecha,
        HoraEntrada,
        HoraSalida,
        TipoEntrada,
        TipoSalida,
        MinutosTarde,
        MinutosExtras,
        HorasTrabajadas,
        Estado,
        Observaciones,
        UbicacionEntrada,
        UbicacionSalida,
        IpEntrada,
        IpSalida,
        ValidadoPor,
        FechaValidacion,
        FechaCreacion,
        FechaActualizacion,
    }
}

mod m20240101_000003_create_turnos_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_turnos_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Turnos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Turnos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Turnos::EmpleadosRut).string_len(12).not_null())
                        .col(ColumnDef::new(Turnos::NombreTurno).string_len(100).not_null())
                        .col(ColumnDef::new(Turnos::HoraEntrada).time().not_null())
                        .col(ColumnDef::new(Turnos::HoraSalida).time().not_null())
                        .col(
                            ColumnDef::new(Turnos::ToleranciaMinutos)
                                .integer()
                                .not_null()
                                .default(15),
                        )
                        .col(ColumnDef::new(Turnos::HorasTrabajo).decimal_len(5, 2).not_null())
                        .col(ColumnDef::new(Turnos::Descripcion).text().null())
                        .col(ColumnDef::new(Turnos::DiasSemana).json().null())
                        .col(ColumnDef::new(Turnos::Activo).boolean().not_null().default(true))
                        .col(
                            ColumnDef::new(Turnos::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EmpleadosTurnos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EmpleadosTurnos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(EmpleadosTurnos::EmpleadosRut)
                                .string_len(12)
                                .not_null(),
                        )
                        .col(ColumnDef::new(EmpleadosTurnos::TurnoId).integer().not_null())
                        .col(ColumnDef::new(EmpleadosTurnos::FechaInicio).date().not_null())
                        .col(ColumnDef::new(EmpleadosTurnos::FechaFin).date().null())
                        .col(
                            ColumnDef::new(EmpleadosTurnos::Activo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(EmpleadosTurnos::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EmpleadosTurnos::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_empleados_turnos_turno_id")
                                .from(EmpleadosTurnos::Table, EmpleadosTurnos::TurnoId)
                                .to(Turnos::Table, Turnos::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Horarios::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Horarios::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Horarios::EmpleadoRut).string_len(12).not_null())
                        .col(ColumnDef::new(Horarios::TurnoId).integer().not_null())
                        .col(ColumnDef::new(Horarios::FechaInicio).date().not_null())
                        .col(ColumnDef::new(Horarios::FechaFin).date().null())
                        .col(ColumnDef::new(Horarios::DiasSemana).json().null())
                        .col(ColumnDef::new(Horarios::Observaciones).text().null())
                        .col(ColumnDef::new(Horarios::Activo).boolean().not_null().default(true))
                        .col(
                            ColumnDef::new(Horarios::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_horarios_turno_id")
                                .from(Horarios::Table, Horarios::TurnoId)
                                .to(Turnos::Table, Turnos::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_turnos_empleados_rut")
                        .table(Turnos::Table)
                        .col(Turnos::EmpleadosRut)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Horarios::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(EmpleadosTurnos::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Turnos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Turnos {
        Table,
        Id,
        EmpleadosRut,
        NombreTurno,
        HoraEntrada,
        HoraSalida,
        ToleranciaMinutos,
        HorasTrabajo,
        Descripcion,
        DiasSemana,
        Activo,
        FechaCreacion,
    }

    #[derive(DeriveIden)]
    enum EmpleadosTurnos {
        Table,
        Id,
        EmpleadosRut,
        TurnoId,
        FechaInicio,
        FechaFin,
        Activo,
        FechaCreacion,
        FechaActualizacion,
    }

    #[derive(DeriveIden)]
    enum Horarios {
        Table,
        Id,
        EmpleadoRut,
        TurnoId,
        FechaInicio,
        FechaFin,
        DiasSemana,
        Observaciones,
        Activo,
        FechaCreacion,
    }
}

mod m20240101_000004_create_solicitudes_tables {
    use super::m20240101_000001_create_empleados_table::Empleados;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_solicitudes_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TiposSolicitudes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TiposSolicitudes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TiposSolicitudes::Nombre).string_len(100).not_null())
                        .col(ColumnDef::new(TiposSolicitudes::Descripcion).text().null())
                        .col(
                            ColumnDef::new(TiposSolicitudes::RequiereAprobacion)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(TiposSolicitudes::DiasAnticipacion)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(TiposSolicitudes::ColorHex)
                                .string_len(7)
                                .not_null()
                                .default("#007bff"),
                        )
                        .col(
                            ColumnDef::new(TiposSolicitudes::Activo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(TiposSolicitudes::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Solicitudes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Solicitudes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Solicitudes::EmpleadoRut).string_len(12).null())
                        .col(ColumnDef::new(Solicitudes::EmpleadoId).integer().not_null())
                        .col(ColumnDef::new(Solicitudes::TipoSolicitudId).integer().not_null())
                        .col(ColumnDef::new(Solicitudes::FechaInicio).date().not_null())
                        .col(ColumnDef::new(Solicitudes::FechaFin).date().not_null())
                        .col(ColumnDef::new(Solicitudes::Motivo).text().not_null())
                        .col(ColumnDef::new(Solicitudes::Estado).string_len(20).not_null())
                        .col(ColumnDef::new(Solicitudes::AprobadoPor).integer().null())
                        .col(
                            ColumnDef::new(Solicitudes::FechaAprobacion)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Solicitudes::ComentarioAprobacion).text().null())
                        .col(ColumnDef::new(Solicitudes::DocumentoAdjunto).string_len(255).null())
                        .col(
                            ColumnDef::new(Solicitudes::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Solicitudes::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_solicitudes_empleado_id")
                                .from(Solicitudes::Table, Solicitudes::EmpleadoId)
                                .to(Empleados::Table, Empleados::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_solicitudes_tipo_solicitud_id")
                                .from(Solicitudes::Table, Solicitudes::TipoSolicitudId)
                                .to(TiposSolicitudes::Table, TiposSolicitudes::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_solicitudes_estado")
                        .table(Solicitudes::Table)
                        .col(Solicitudes::Estado)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Solicitudes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TiposSolicitudes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TiposSolicitudes {
        Table,
        Id,
        Nombre,
        Descripcion,
        RequiereAprobacion,
        DiasAnticipacion,
        ColorHex,
        Activo,
        FechaCreacion,
    }

    #[derive(DeriveIden)]
    enum Solicitudes {
        Table,
        Id,
        EmpleadoRut,
        EmpleadoId,
        TipoSolicitudId,
        FechaInicio,
        FechaFin,
        Motivo,
        Estado,
        AprobadoPor,
        FechaAprobacion,
        ComentarioAprobacion,
        DocumentoAdjunto,
        FechaCreacion,
        FechaActualizacion,
    }
}

mod m20240101_000005_create_notificaciones_table {
    use super::m20240101_000001_create_empleados_table::Empleados;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_notificaciones_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Notificaciones::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Notificaciones::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Notificaciones::EmpleadoId).integer().not_null())
                        .col(ColumnDef::new(Notificaciones::Tipo).string_len(20).not_null())
                        .col(ColumnDef::new(Notificaciones::Titulo).string_len(200).not_null())
                        .col(ColumnDef::new(Notificaciones::Mensaje).text().not_null())
                        .col(ColumnDef::new(Notificaciones::Modulo).string_len(50).null())
                        .col(ColumnDef::new(Notificaciones::ReferenciaId).integer().null())
                        .col(
                            ColumnDef::new(Notificaciones::Leida)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Notificaciones::FechaLectura)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Notificaciones::RequiereAccion)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Notificaciones::UrlAccion).string_len(255).null())
                        .col(
                            ColumnDef::new(Notificaciones::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Notificaciones::FechaExpiracion)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_notificaciones_empleado_id")
                                .from(Notificaciones::Table, Notificaciones::EmpleadoId)
                                .to(Empleados::Table, Empleados::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_notificaciones_empleado_leida")
                        .table(Notificaciones::Table)
                        .col(Notificaciones::EmpleadoId)
                        .col(Notificaciones::Leida)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Notificaciones::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Notificaciones {
        Table,
        Id,
        EmpleadoId,
        Tipo,
        Titulo,
        Mensaje,
        Modulo,
        ReferenciaId,
        Leida,
        FechaLectura,
        RequiereAccion,
        UrlAccion,
        FechaCreacion,
        FechaExpiracion,
    }
}

mod m20240101_000006_create_tareas_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_tareas_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tareas::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Tareas::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Tareas::Titulo).string_len(200).not_null())
                        .col(ColumnDef::new(Tareas::Descripcion).text().null())
                        .col(ColumnDef::new(Tareas::TipoTarea).string_len(20).not_null())
                        .col(ColumnDef::new(Tareas::Prioridad).string_len(20).not_null())
                        .col(ColumnDef::new(Tareas::Estado).string_len(20).not_null())
                        .col(ColumnDef::new(Tareas::AsignadaARut).string_len(12).null())
                        .col(ColumnDef::new(Tareas::CreadaPorRut).string_len(12).not_null())
                        .col(ColumnDef::new(Tareas::FechaInicio).timestamp_with_time_zone().null())
                        .col(
                            ColumnDef::new(Tareas::FechaVencimiento)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Tareas::FechaCompletada)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Tareas::EsRecurrente)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Tareas::FrecuenciaRecurrencia).string_len(20).null())
                        .col(ColumnDef::new(Tareas::DiasRecurrencia).json().null())
                        .col(ColumnDef::new(Tareas::Ubicacion).string_len(200).null())
                        .col(ColumnDef::new(Tareas::ModuloRelacionado).string_len(50).null())
                        .col(ColumnDef::new(Tareas::RegistroRelacionadoId).integer().null())
                        .col(ColumnDef::new(Tareas::TiempoEstimadoMinutos).integer().null())
                        .col(ColumnDef::new(Tareas::TiempoRealMinutos).integer().null())
                        .col(
                            ColumnDef::new(Tareas::PorcentajeCompletado)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Tareas::Notas).text().null())
                        .col(ColumnDef::new(Tareas::ArchivoAdjunto).string_len(255).null())
                        .col(
                            ColumnDef::new(Tareas::RequiereAprobacion)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Tareas::AprobadaPorRut).string_len(12).null())
                        .col(
                            ColumnDef::new(Tareas::FechaAprobacion)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Tareas::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tareas::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Tareas::Activo).boolean().not_null().default(true))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TareasComentarios::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TareasComentarios::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TareasComentarios::TareaId).integer().not_null())
                        .col(
                            ColumnDef::new(TareasComentarios::EmpleadoRut)
                                .string_len(12)
                                .not_null(),
                        )
                        .col(ColumnDef::new(TareasComentarios::Comentario).text().not_null())
                        .col(
                            ColumnDef::new(TareasComentarios::ArchivoAdjunto)
                                .string_len(255)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TareasComentarios::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tareas_comentarios_tarea_id")
                                .from(TareasComentarios::Table, TareasComentarios::TareaId)
                                .to(Tareas::Table, Tareas::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TareasHistorial::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TareasHistorial::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TareasHistorial::TareaId).integer().not_null())
                        .col(
                            ColumnDef::new(TareasHistorial::EmpleadoRut)
                                .string_len(12)
                                .not_null(),
                        )
                        .col(ColumnDef::new(TareasHistorial::Accion).string_len(50).not_null())
                        .col(ColumnDef::new(TareasHistorial::CampoModificado).string_len(50).null())
                        .col(ColumnDef::new(TareasHistorial::ValorAnterior).text().null())
                        .col(ColumnDef::new(TareasHistorial::ValorNuevo).text().null())
                        .col(ColumnDef::new(TareasHistorial::Descripcion).text().null())
                        .col(
                            ColumnDef::new(TareasHistorial::FechaRegistro)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tareas_historial_tarea_id")
                                .from(TareasHistorial::Table, TareasHistorial::TareaId)
                                .to(Tareas::Table, Tareas::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tareas_asignada_a_rut")
                        .table(Tareas::Table)
                        .col(Tareas::AsignadaARut)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TareasHistorial::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TareasComentarios::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Tareas::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Tareas {
        Table,
        Id,
        Titulo,
        Descripcion,
        TipoTarea,
        Prioridad,
        Estado,
        #[sea_orm(iden = "asignada_a_rut")]
        AsignadaARut,
        CreadaPorRut,
        FechaInicio,
        FechaVencimiento,
        FechaCompletada,
        EsRecurrente,
        FrecuenciaRecurrencia,
        DiasRecurrencia,
        Ubicacion,
        ModuloRelacionado,
        RegistroRelacionadoId,
        TiempoEstimadoMinutos,
        TiempoRealMinutos,
        PorcentajeCompletado,
        Notas,
        ArchivoAdjunto,
        RequiereAprobacion,
        AprobadaPorRut,
        FechaAprobacion,
        FechaCreacion,
        FechaActualizacion,
        Activo,
    }

    #[derive(DeriveIden)]
    enum TareasComentarios {
        Table,
        Id,
        TareaId,
        EmpleadoRut,
        Comentario,
        ArchivoAdjunto,
        FechaCreacion,
    }

    #[derive(DeriveIden)]
    enum TareasHistorial {
        Table,
        Id,
        TareaId,
        EmpleadoRut,
        Accion,
        CampoModificado,
        ValorAnterior,
        ValorNuevo,
        Descripcion,
        FechaRegistro,
    }
}

mod m20240101_000007_create_inventario_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_inventario_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventario::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventario::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Inventario::CodigoProducto)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Inventario::NombreProducto).string_len(200).not_null())
                        .col(ColumnDef::new(Inventario::Descripcion).text().null())
                        .col(ColumnDef::new(Inventario::Categoria).string_len(20).not_null())
                        .col(ColumnDef::new(Inventario::UnidadMedida).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Inventario::CantidadActual)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventario::CantidadMinima)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Inventario::CantidadMaxima).decimal_len(12, 2).null())
                        .col(ColumnDef::new(Inventario::PrecioUnitario).decimal_len(12, 2).null())
                        .col(ColumnDef::new(Inventario::PrecioVenta).decimal_len(12, 2).null())
                        .col(ColumnDef::new(Inventario::CodigoQr).string_len(255).null())
                        .col(ColumnDef::new(Inventario::CodigoBarra).string_len(100).null())
                        .col(ColumnDef::new(Inventario::Ubicacion).string_len(100).null())
                        .col(ColumnDef::new(Inventario::Proveedor).string_len(200).null())
                        .col(ColumnDef::new(Inventario::ContactoProveedor).string_len(200).null())
                        .col(
                            ColumnDef::new(Inventario::FechaUltimoIngreso)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Inventario::FechaVencimiento).date().null())
                        .col(ColumnDef::new(Inventario::Lote).string_len(50).null())
                        .col(ColumnDef::new(Inventario::Estado).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Inventario::RequiereAlerta)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Inventario::ImagenProducto).string_len(255).null())
                        .col(ColumnDef::new(Inventario::Notas).text().null())
                        .col(ColumnDef::new(Inventario::CreadoPor).integer().null())
                        .col(ColumnDef::new(Inventario::ActualizadoPor).integer().null())
                        .col(ColumnDef::new(Inventario::Activo).boolean().not_null().default(true))
                        .col(
                            ColumnDef::new(Inventario::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Inventario::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventario_categoria")
                        .table(Inventario::Table)
                        .col(Inventario::Categoria)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventario_fecha_vencimiento")
                        .table(Inventario::Table)
                        .col(Inventario::FechaVencimiento)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Inventario::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Inventario {
        Table,
        Id,
        CodigoProducto,
        NombreProducto,
        Descripcion,
        Categoria,
        UnidadMedida,
        CantidadActual,
        CantidadMinima,
        CantidadMaxima,
        PrecioUnitario,
        PrecioVenta,
        CodigoQr,
        CodigoBarra,
        Ubicacion,
        Proveedor,
        ContactoProveedor,
        FechaUltimoIngreso,
        FechaVencimiento,
        Lote,
        Estado,
        RequiereAlerta,
        ImagenProducto,
        Notas,
        CreadoPor,
        ActualizadoPor,
        Activo,
        FechaCreacion,
        FechaActualizacion,
    }
}

mod m20240101_000008_create_compras_tables {
    use super::m20240101_000007_create_inventario_table::Inventario;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_compras_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Proveedores::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Proveedores::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Proveedores::Nombre)
                                .string_len(200)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Proveedores::RazonSocial).string_len(200).null())
                        .col(
                            ColumnDef::new(Proveedores::Rut)
                                .string_len(12)
                                .null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Proveedores::Email).string_len(254).null())
                        .col(ColumnDef::new(Proveedores::Telefono).string_len(20).null())
                        .col(ColumnDef::new(Proveedores::Celular).string_len(20).null())
                        .col(ColumnDef::new(Proveedores::SitioWeb).string_len(200).null())
                        .col(ColumnDef::new(Proveedores::Direccion).text().null())
                        .col(ColumnDef::new(Proveedores::Ciudad).string_len(100).null())
                        .col(ColumnDef::new(Proveedores::Region).string_len(100).null())
                        .col(ColumnDef::new(Proveedores::CodigoPostal).string_len(20).null())
                        .col(
                            ColumnDef::new(Proveedores::Pais)
                                .string_len(100)
                                .not_null()
                                .default("Chile"),
                        )
                        .col(ColumnDef::new(Proveedores::ContactoPrincipal).string_len(200).null())
                        .col(ColumnDef::new(Proveedores::CargoContacto).string_len(100).null())
                        .col(ColumnDef::new(Proveedores::EmailContacto).string_len(254).null())
                        .col(ColumnDef::new(Proveedores::TelefonoContacto).string_len(20).null())
                        .col(ColumnDef::new(Proveedores::Estado).string_len(20).not_null())
                        .col(ColumnDef::new(Proveedores::Categoria).string_len(100).null())
                        .col(ColumnDef::new(Proveedores::TipoProveedor).string_len(100).null())
                        .col(ColumnDef::new(Proveedores::CondicionesPago).string_len(200).null())
                        .col(ColumnDef::new(Proveedores::PlazoEntrega).string_len(100).null())
                        .col(
                            ColumnDef::new(Proveedores::Descuento)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Proveedores::Notas).text().null())
                        .col(ColumnDef::new(Proveedores::Activo).boolean().not_null().default(true))
                        .col(ColumnDef::new(Proveedores::CreadoPor).integer().null())
                        .col(ColumnDef::new(Proveedores::ActualizadoPor).integer().null())
                        .col(
                            ColumnDef::new(Proveedores::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Proveedores::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrdenesCompra::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrdenesCompra::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(OrdenesCompra::NumeroOrden)
                                .string_len(50)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(OrdenesCompra::ProveedorId).integer().not_null())
                        .col(ColumnDef::new(OrdenesCompra::FechaOrden).date().not_null())
                        .col(ColumnDef::new(OrdenesCompra::FechaEntregaEsperada).date().null())
                        .col(ColumnDef::new(OrdenesCompra::FechaEntregaReal).date().null())
                        .col(ColumnDef::new(OrdenesCompra::Estado).string_len(30).not_null())
                        .col(
                            ColumnDef::new(OrdenesCompra::Subtotal)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrdenesCompra::Descuento)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrdenesCompra::Impuestos)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrdenesCompra::Total)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(OrdenesCompra::Moneda)
                                .string_len(3)
                                .not_null()
                                .default("CLP"),
                        )
                        .col(ColumnDef::new(OrdenesCompra::CondicionesPago).string_len(200).null())
                        .col(ColumnDef::new(OrdenesCompra::MetodoEnvio).string_len(100).null())
                        .col(ColumnDef::new(OrdenesCompra::DireccionEntrega).text().null())
                        .col(ColumnDef::new(OrdenesCompra::Notas).text().null())
                        .col(ColumnDef::new(OrdenesCompra::NumeroFactura).string_len(50).null())
                        .col(ColumnDef::new(OrdenesCompra::CreadoPor).integer().null())
                        .col(ColumnDef::new(OrdenesCompra::AprobadoPor).integer().null())
                        .col(
                            ColumnDef::new(OrdenesCompra::FechaCreacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrdenesCompra::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrdenesCompra::FechaAprobacion)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_ordenes_compra_proveedor_id")
                                .from(OrdenesCompra::Table, OrdenesCompra::ProveedorId)
                                .to(Proveedores::Table, Proveedores::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemsOrdenCompra::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemsOrdenCompra::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ItemsOrdenCompra::OrdenCompraId).integer().not_null())
                        .col(ColumnDef::new(ItemsOrdenCompra::ProductoId).integer().null())
                        .col(ColumnDef::new(ItemsOrdenCompra::CodigoProducto).string_len(50).null())
                        .col(
                            ColumnDef::new(ItemsOrdenCompra::NombreProducto)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemsOrdenCompra::Descripcion).text().null())
                        .col(ColumnDef::new(ItemsOrdenCompra::Cantidad).integer().not_null())
                        .col(
                            ColumnDef::new(ItemsOrdenCompra::CantidadRecibida)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ItemsOrdenCompra::UnidadMedida)
                                .string_len(20)
                                .not_null()
                                .default("unidad"),
                        )
                        .col(
                            ColumnDef::new(ItemsOrdenCompra::PrecioUnitario)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemsOrdenCompra::Descuento)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(ItemsOrdenCompra::PrecioTotal).big_integer().not_null())
                        .col(ColumnDef::new(ItemsOrdenCompra::Notas).text().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_orden_compra_orden_id")
                                .from(ItemsOrdenCompra::Table, ItemsOrdenCompra::OrdenCompraId)
                                .to(OrdenesCompra::Table, OrdenesCompra::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_orden_compra_producto_id")
                                .from(ItemsOrdenCompra::Table, ItemsOrdenCompra::ProductoId)
                                .to(Inventario::Table, Inventario::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_ordenes_compra_estado")
                        .table(OrdenesCompra::Table)
                        .col(OrdenesCompra::Estado)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemsOrdenCompra::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrdenesCompra::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Proveedores::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Proveedores {
        Table,
        Id,
        Nombre,
        RazonSocial,
        Rut,
        Email,
        Telefono,
        Celular,
        SitioWeb,
        Direccion,
        Ciudad,
        Region,
        CodigoPostal,
        Pais,
        ContactoPrincipal,
        CargoContacto,
        EmailContacto,
        TelefonoContacto,
        Estado,
        Categoria,
        TipoProveedor,
        CondicionesPago,
        PlazoEntrega,
        Descuento,
        Notas,
        Activo,
        CreadoPor,
        ActualizadoPor,
        FechaCreacion,
        FechaActualizacion,
    }

    #[derive(DeriveIden)]
    enum OrdenesCompra {
        Table,
        Id,
        NumeroOrden,
        ProveedorId,
        FechaOrden,
        FechaEntregaEsperada,
        FechaEntregaReal,
        Estado,
        Subtotal,
        Descuento,
        Impuestos,
        Total,
        Moneda,
        CondicionesPago,
        MetodoEnvio,
        DireccionEntrega,
        Notas,
        NumeroFactura,
        CreadoPor,
        AprobadoPor,
        FechaCreacion,
        FechaActualizacion,
        FechaAprobacion,
    }

    #[derive(DeriveIden)]
    enum ItemsOrdenCompra {
        Table,
        Id,
        OrdenCompraId,
        ProductoId,
        CodigoProducto,
        NombreProducto,
        Descripcion,
        Cantidad,
        CantidadRecibida,
        UnidadMedida,
        PrecioUnitario,
        Descuento,
        PrecioTotal,
        Notas,
    }
}

mod m20240101_000009_create_sistema_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_sistema_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ConfiguracionApp::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConfiguracionApp::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ConfiguracionApp::Clave)
                                .string_len(100)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ConfiguracionApp::Valor).text().not_null())
                        .col(ColumnDef::new(ConfiguracionApp::Tipo).string_len(20).not_null())
                        .col(ColumnDef::new(ConfiguracionApp::Descripcion).text().null())
                        .col(ColumnDef::new(ConfiguracionApp::Categoria).string_len(50).null())
                        .col(
                            ColumnDef::new(ConfiguracionApp::FechaActualizacion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Reportes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Reportes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Reportes::NombreReporte).string_len(200).not_null())
                        .col(ColumnDef::new(Reportes::TipoReporte).string_len(20).not_null())
                        .col(ColumnDef::new(Reportes::PeriodoInicio).date().null())
                        .col(ColumnDef::new(Reportes::PeriodoFin).date().null())
                        .col(ColumnDef::new(Reportes::Parametros).json().null())
                        .col(ColumnDef::new(Reportes::ArchivoGenerado).string_len(255).null())
                        .col(ColumnDef::new(Reportes::Formato).string_len(10).not_null())
                        .col(ColumnDef::new(Reportes::GeneradoPor).integer().null())
                        .col(
                            ColumnDef::new(Reportes::FechaGeneracion)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Reportes::TiempoGeneracion).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LogsActividad::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LogsActividad::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(LogsActividad::EmpleadoId).integer().null())
                        .col(ColumnDef::new(LogsActividad::Modulo).string_len(50).not_null())
                        .col(ColumnDef::new(LogsActividad::Accion).string_len(100).not_null())
                        .col(ColumnDef::new(LogsActividad::TablaAfectada).string_len(50).null())
                        .col(ColumnDef::new(LogsActividad::RegistroId).integer().null())
                        .col(ColumnDef::new(LogsActividad::Descripcion).text().null())
                        .col(ColumnDef::new(LogsActividad::DatosAnteriores).json().null())
                        .col(ColumnDef::new(LogsActividad::DatosNuevos).json().null())
                        .col(ColumnDef::new(LogsActividad::IpAddress).string_len(45).null())
                        .col(ColumnDef::new(LogsActividad::UserAgent).text().null())
                        .col(
                            ColumnDef::new(LogsActividad::FechaRegistro)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_logs_actividad_modulo")
                        .table(LogsActividad::Table)
                        .col(LogsActividad::Modulo)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LogsActividad::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Reportes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ConfiguracionApp::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ConfiguracionApp {
        Table,
        Id,
        Clave,
        Valor,
        Tipo,
        Descripcion,
        Categoria,
        FechaActualizacion,
    }

    #[derive(DeriveIden)]
    enum Reportes {
        Table,
        Id,
        NombreReporte,
        TipoReporte,
        PeriodoInicio,
        PeriodoFin,
        Parametros,
        ArchivoGenerado,
        Formato,
        GeneradoPor,
        FechaGeneracion,
        TiempoGeneracion,
    }

    #[derive(DeriveIden)]
    enum LogsActividad {
        Table,
        Id,
        EmpleadoId,
        Modulo,
        Accion,
        TablaAfectada,
        RegistroId,
        Descripcion,
        DatosAnteriores,
        DatosNuevos,
        IpAddress,
        UserAgent,
        FechaRegistro,
    }
}

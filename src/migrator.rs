use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_work_orders_table::Migration),
            Box::new(m20240101_000002_create_work_order_photos_table::Migration),
            Box::new(m20240101_000003_create_signatures_table::Migration),
            Box::new(m20240101_000004_create_workers_table::Migration),
            Box::new(m20240101_000005_create_sites_table::Migration),
            Box::new(m20240101_000006_create_documents_table::Migration),
            Box::new(m20240101_000007_create_document_fields_table::Migration),
            Box::new(m20240101_000008_create_document_signatures_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_work_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_work_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrders::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::WorkOrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(WorkOrders::Date).string().not_null())
                        .col(ColumnDef::new(WorkOrders::SiteName).string().null())
                        .col(ColumnDef::new(WorkOrders::Building).string().null())
                        .col(ColumnDef::new(WorkOrders::Floor).string().null())
                        .col(ColumnDef::new(WorkOrders::Unit).string().null())
                        .col(ColumnDef::new(WorkOrders::Reason).string().null())
                        .col(ColumnDef::new(WorkOrders::WorkerName).string().null())
                        .col(
                            ColumnDef::new(WorkOrders::Amount)
                                .double()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::UniqueLink)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(WorkOrders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(WorkOrders::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            // Useful indexes
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_site")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::SiteName)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_status")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_date")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::Date)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum WorkOrders {
        Table,
        Id,
        WorkOrderNumber,
        Date,
        SiteName,
        Building,
        Floor,
        Unit,
        Reason,
        WorkerName,
        Amount,
        Status,
        UniqueLink,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_work_order_photos_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_work_orders_table::WorkOrders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_work_order_photos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderPhotos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrderPhotos::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderPhotos::WorkOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderPhotos::PhotoPath)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderPhotos::OriginalName)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderPhotos::FileSize)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrderPhotos::UploadedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_photos_work_order")
                                .from(WorkOrderPhotos::Table, WorkOrderPhotos::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_photos_work_order")
                        .table(WorkOrderPhotos::Table)
                        .col(WorkOrderPhotos::WorkOrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkOrderPhotos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum WorkOrderPhotos {
        Table,
        Id,
        WorkOrderId,
        PhotoPath,
        OriginalName,
        FileSize,
        UploadedAt,
    }
}

mod m20240101_000003_create_signatures_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_work_orders_table::WorkOrders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_signatures_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Signatures::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Signatures::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Signatures::WorkOrderId).integer().not_null())
                        .col(ColumnDef::new(Signatures::SignatureData).text().not_null())
                        .col(ColumnDef::new(Signatures::SignerName).string().null())
                        .col(ColumnDef::new(Signatures::SignerEmail).string().null())
                        .col(ColumnDef::new(Signatures::SignedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_signatures_work_order")
                                .from(Signatures::Table, Signatures::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_signatures_work_order")
                        .table(Signatures::Table)
                        .col(Signatures::WorkOrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Signatures::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Signatures {
        Table,
        Id,
        WorkOrderId,
        SignatureData,
        SignerName,
        SignerEmail,
        SignedAt,
    }
}

mod m20240101_000004_create_workers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_workers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Workers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Workers::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Workers::Name).string().not_null())
                        .col(ColumnDef::new(Workers::Phone).string().null())
                        .col(ColumnDef::new(Workers::Email).string().null())
                        .col(ColumnDef::new(Workers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Workers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Workers {
        Table,
        Id,
        Name,
        Phone,
        Email,
        CreatedAt,
    }
}

mod m20240101_000005_create_sites_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_sites_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sites::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Sites::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Sites::Name).string().not_null().unique_key())
                        .col(ColumnDef::new(Sites::LastUsedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Sites::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Sites {
        Table,
        Id,
        Name,
        LastUsedAt,
    }
}

mod m20240101_000006_create_documents_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_documents_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Documents::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Documents::Title).string().not_null())
                        .col(ColumnDef::new(Documents::Description).string().null())
                        .col(ColumnDef::new(Documents::FilePath).string().not_null())
                        .col(ColumnDef::new(Documents::OriginalName).string().not_null())
                        .col(
                            ColumnDef::new(Documents::FileSize)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Documents::UniqueId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Documents::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(Documents::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Documents::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_documents_status")
                        .table(Documents::Table)
                        .col(Documents::Status)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Documents {
        Table,
        Id,
        Title,
        Description,
        FilePath,
        OriginalName,
        FileSize,
        UniqueId,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000007_create_document_fields_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000006_create_documents_table::Documents;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_document_fields_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentFields::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentFields::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentFields::DocumentId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentFields::FieldType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DocumentFields::Name).string().not_null())
                        .col(ColumnDef::new(DocumentFields::Label).string().null())
                        .col(
                            ColumnDef::new(DocumentFields::PageNumber)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(DocumentFields::PosX).double().not_null())
                        .col(ColumnDef::new(DocumentFields::PosY).double().not_null())
                        .col(ColumnDef::new(DocumentFields::Width).double().not_null())
                        .col(ColumnDef::new(DocumentFields::Height).double().not_null())
                        .col(
                            ColumnDef::new(DocumentFields::Required)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(DocumentFields::SortOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_fields_document")
                                .from(DocumentFields::Table, DocumentFields::DocumentId)
                                .to(Documents::Table, Documents::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_fields_document")
                        .table(DocumentFields::Table)
                        .col(DocumentFields::DocumentId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DocumentFields::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum DocumentFields {
        Table,
        Id,
        DocumentId,
        FieldType,
        Name,
        Label,
        PageNumber,
        PosX,
        PosY,
        Width,
        Height,
        Required,
        SortOrder,
    }
}

mod m20240101_000008_create_document_signatures_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000006_create_documents_table::Documents;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_document_signatures_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DocumentSignatures::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DocumentSignatures::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSignatures::DocumentId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSignatures::SignatureData)
                                .text()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSignatures::SignerName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSignatures::SignerEmail)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSignatures::FieldValues)
                                .json()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DocumentSignatures::SignedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_document_signatures_document")
                                .from(DocumentSignatures::Table, DocumentSignatures::DocumentId)
                                .to(Documents::Table, Documents::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_document_signatures_document")
                        .table(DocumentSignatures::Table)
                        .col(DocumentSignatures::DocumentId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DocumentSignatures::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum DocumentSignatures {
        Table,
        Id,
        DocumentId,
        SignatureData,
        SignerName,
        SignerEmail,
        FieldValues,
        SignedAt,
    }
}

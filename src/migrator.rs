use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_locations_table::Migration),
            Box::new(m20240301_000002_create_stock_records_table::Migration),
            Box::new(m20240301_000003_create_stock_movements_table::Migration),
            Box::new(m20240301_000004_create_pick_tables::Migration),
            Box::new(m20240301_000005_create_cycle_count_tables::Migration),
        ]
    }
}

mod m20240301_000001_create_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Locations::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Locations::Code).string().not_null())
                        .col(ColumnDef::new(Locations::Aisle).string().null())
                        .col(ColumnDef::new(Locations::Bay).integer().null())
                        .col(ColumnDef::new(Locations::Level).integer().null())
                        .col(ColumnDef::new(Locations::Kind).string().not_null())
                        .col(ColumnDef::new(Locations::CaseCapacity).integer().null())
                        .col(
                            ColumnDef::new(Locations::RequiresForklift)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Locations::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Locations::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_locations_code")
                        .table(Locations::Table)
                        .col(Locations::Code)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Locations {
        Table,
        Id,
        Code,
        Aisle,
        Bay,
        Level,
        Kind,
        CaseCapacity,
        RequiresForklift,
        Active,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_stock_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stock_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::LocationId).uuid().not_null())
                        .col(ColumnDef::new(StockRecords::ProductId).uuid().not_null())
                        .col(ColumnDef::new(StockRecords::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(StockRecords::Arrangement).string().not_null())
                        .col(
                            ColumnDef::new(StockRecords::QuantityCases)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockRecords::ReservedCases)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(StockRecords::ExpiresAt).timestamp().null())
                        .col(
                            ColumnDef::new(StockRecords::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(StockRecords::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRecords::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_records_key")
                        .table(StockRecords::Table)
                        .col(StockRecords::LocationId)
                        .col(StockRecords::ProductId)
                        .col(StockRecords::OwnerId)
                        .col(StockRecords::Arrangement)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_records_product")
                        .table(StockRecords::Table)
                        .col(StockRecords::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockRecords::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockRecords {
        Table,
        Id,
        LocationId,
        ProductId,
        OwnerId,
        Arrangement,
        QuantityCases,
        ReservedCases,
        ExpiresAt,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_stock_movements_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().null())
                        .col(ColumnDef::new(StockMovements::FromLocationId).uuid().null())
                        .col(ColumnDef::new(StockMovements::ToLocationId).uuid().null())
                        .col(ColumnDef::new(StockMovements::FromOwnerId).uuid().null())
                        .col(ColumnDef::new(StockMovements::ToOwnerId).uuid().null())
                        .col(ColumnDef::new(StockMovements::Arrangement).string().null())
                        .col(
                            ColumnDef::new(StockMovements::FromArrangement)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityCases)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::CommissionPercent)
                                .decimal_len(5, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::ReferenceId).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::ReferenceType)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reason).string().null())
                        .col(
                            ColumnDef::new(StockMovements::RecordedBy)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::OccurredAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_product")
                        .table(StockMovements::Table)
                        .col(StockMovements::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_occurred_at")
                        .table(StockMovements::Table)
                        .col(StockMovements::OccurredAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_reference")
                        .table(StockMovements::Table)
                        .col(StockMovements::ReferenceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockMovements {
        Table,
        Id,
        MovementType,
        ProductId,
        FromLocationId,
        ToLocationId,
        FromOwnerId,
        ToOwnerId,
        Arrangement,
        FromArrangement,
        QuantityCases,
        CommissionPercent,
        ReferenceId,
        ReferenceType,
        Reason,
        RecordedBy,
        OccurredAt,
    }
}

mod m20240301_000004_create_pick_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_pick_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PickLists::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(PickLists::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(PickLists::Reference).string().null())
                        .col(ColumnDef::new(PickLists::Status).string().not_null())
                        .col(
                            ColumnDef::new(PickLists::TotalItems)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PickLists::PickedItems)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PickLists::PickedCases)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PickLists::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(PickLists::CompletedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PickListItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PickListItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PickListItems::PickListId).uuid().not_null())
                        .col(ColumnDef::new(PickListItems::Position).integer().not_null())
                        .col(ColumnDef::new(PickListItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(PickListItems::OwnerId).uuid().not_null())
                        .col(
                            ColumnDef::new(PickListItems::Arrangement)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickListItems::QuantityCases)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PickListItems::SuggestedLocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PickListItems::Status).string().not_null())
                        .col(ColumnDef::new(PickListItems::PickedCases).integer().null())
                        .col(ColumnDef::new(PickListItems::PickedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pick_list_items_list")
                        .table(PickListItems::Table)
                        .col(PickListItems::PickListId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PickScans::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(PickScans::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(PickScans::PickListId).uuid().not_null())
                        .col(ColumnDef::new(PickScans::Barcode).string().not_null())
                        .col(ColumnDef::new(PickScans::ScannedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pick_scans_list_barcode")
                        .table(PickScans::Table)
                        .col(PickScans::PickListId)
                        .col(PickScans::Barcode)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PickScans::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PickListItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PickLists::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum PickLists {
        Table,
        Id,
        Reference,
        Status,
        TotalItems,
        PickedItems,
        PickedCases,
        CreatedAt,
        CompletedAt,
    }

    #[derive(Iden)]
    enum PickListItems {
        Table,
        Id,
        PickListId,
        Position,
        ProductId,
        OwnerId,
        Arrangement,
        QuantityCases,
        SuggestedLocationId,
        Status,
        PickedCases,
        PickedAt,
    }

    #[derive(Iden)]
    enum PickScans {
        Table,
        Id,
        PickListId,
        Barcode,
        ScannedAt,
    }
}

mod m20240301_000005_create_cycle_count_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_cycle_count_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CycleCounts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CycleCounts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CycleCounts::LocationId).uuid().not_null())
                        .col(ColumnDef::new(CycleCounts::Status).string().not_null())
                        .col(
                            ColumnDef::new(CycleCounts::DiscrepancyItems)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(CycleCounts::CreatedBy).string().not_null())
                        .col(ColumnDef::new(CycleCounts::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(CycleCounts::StartedAt).timestamp().null())
                        .col(ColumnDef::new(CycleCounts::CompletedAt).timestamp().null())
                        .col(ColumnDef::new(CycleCounts::ReconciledAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cycle_counts_location")
                        .table(CycleCounts::Table)
                        .col(CycleCounts::LocationId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CycleCountItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CycleCountItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CycleCountItems::CycleCountId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CycleCountItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CycleCountItems::OwnerId).uuid().not_null())
                        .col(
                            ColumnDef::new(CycleCountItems::Arrangement)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CycleCountItems::ExpectedCases)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CycleCountItems::CountedCases)
                                .integer()
                                .null(),
                        )
                        .col(ColumnDef::new(CycleCountItems::Discrepancy).integer().null())
                        .col(ColumnDef::new(CycleCountItems::Approved).boolean().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cycle_count_items_count")
                        .table(CycleCountItems::Table)
                        .col(CycleCountItems::CycleCountId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CycleCountItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CycleCounts::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum CycleCounts {
        Table,
        Id,
        LocationId,
        Status,
        DiscrepancyItems,
        CreatedBy,
        CreatedAt,
        StartedAt,
        CompletedAt,
        ReconciledAt,
    }

    #[derive(Iden)]
    enum CycleCountItems {
        Table,
        Id,
        CycleCountId,
        ProductId,
        OwnerId,
        Arrangement,
        ExpectedCases,
        CountedCases,
        Discrepancy,
        Approved,
    }
}

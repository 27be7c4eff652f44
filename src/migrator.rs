use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_categories_table::Migration),
            Box::new(m20250101_000002_create_quotations_table::Migration),
            Box::new(m20250101_000003_create_quotation_details_table::Migration),
            Box::new(m20250101_000004_create_status_history_table::Migration),
            Box::new(m20250101_000005_create_price_source_tables::Migration),
            Box::new(m20250101_000006_create_coupons_table::Migration),
            Box::new(m20250101_000007_create_sales_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20250101_000001_create_categories_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Categories::Name).string().not_null())
                        .col(ColumnDef::new(Categories::ParentId).uuid().null())
                        .col(
                            ColumnDef::new(Categories::Level)
                                .small_integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Categories::MinMarginPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Categories::NormalMarginPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Categories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Categories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_categories_parent_id")
                        .table(Categories::Table)
                        .col(Categories::ParentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Categories {
        Table,
        Id,
        Name,
        ParentId,
        Level,
        MinMarginPercentage,
        NormalMarginPercentage,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000002_create_quotations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_quotations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Quotations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Quotations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::Code)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Quotations::SellerId).uuid().not_null())
                        .col(ColumnDef::new(Quotations::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Quotations::CustomerName).string().not_null())
                        .col(
                            ColumnDef::new(Quotations::CustomerDocument)
                                .string_len(15)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Quotations::CustomerEmail).string().null())
                        .col(ColumnDef::new(Quotations::CustomerPhone).string().null())
                        .col(ColumnDef::new(Quotations::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(Quotations::CouponId).uuid().null())
                        .col(
                            ColumnDef::new(Quotations::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::Currency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::ExchangeRate)
                                .decimal_len(10, 4)
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Quotations::Subtotal)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::Discount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::CouponDiscount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::Tax)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::ShippingCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::PackagingCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::AssemblyCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::Total)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::TotalCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::TotalMargin)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::MarginPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::CommissionPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::CommissionAmount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Quotations::CommissionPaid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Quotations::QuotationDate).date().not_null())
                        .col(ColumnDef::new(Quotations::ValidUntil).date().not_null())
                        .col(
                            ColumnDef::new(Quotations::SentAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Quotations::SentToEmail).string().null())
                        .col(ColumnDef::new(Quotations::ConvertedSaleId).uuid().null())
                        .col(
                            ColumnDef::new(Quotations::ConvertedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Quotations::Notes).text().null())
                        .col(
                            ColumnDef::new(Quotations::IsArchived)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Quotations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Quotations::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quotations_status")
                        .table(Quotations::Table)
                        .col(Quotations::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quotations_seller_id")
                        .table(Quotations::Table)
                        .col(Quotations::SellerId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Quotations::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Quotations {
        Table,
        Id,
        Code,
        SellerId,
        CustomerId,
        CustomerName,
        CustomerDocument,
        CustomerEmail,
        CustomerPhone,
        WarehouseId,
        CouponId,
        Status,
        Currency,
        ExchangeRate,
        Subtotal,
        Discount,
        CouponDiscount,
        Tax,
        ShippingCost,
        PackagingCost,
        AssemblyCost,
        Total,
        TotalCost,
        TotalMargin,
        MarginPercentage,
        CommissionPercentage,
        CommissionAmount,
        CommissionPaid,
        QuotationDate,
        ValidUntil,
        SentAt,
        SentToEmail,
        ConvertedSaleId,
        ConvertedAt,
        Notes,
        IsArchived,
        CreatedAt,
        UpdatedAt,
        Version,
    }
}

mod m20250101_000003_create_quotation_details_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_quotation_details_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuotationDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuotationDetails::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::QuotationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::ProductName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::ProductSku)
                                .string_len(64)
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationDetails::ProductBrand).string().null())
                        .col(
                            ColumnDef::new(QuotationDetails::CategoryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::PurchasePrice)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::DistributionPrice)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::Discount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::DiscountPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::Subtotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::TaxAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::Total)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::UnitCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::TotalCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::UnitMargin)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::TotalMargin)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::MarginPercentage)
                                .decimal_len(5, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::SourceType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationDetails::WarehouseId).uuid().null())
                        .col(ColumnDef::new(QuotationDetails::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(QuotationDetails::SupplierProductId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::IsRequestedFromSupplier)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::InStock)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::AvailableStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationDetails::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotation_details_quotation")
                                .from(QuotationDetails::Table, QuotationDetails::QuotationId)
                                .to(Quotations::Table, Quotations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quotation_details_quotation_id")
                        .table(QuotationDetails::Table)
                        .col(QuotationDetails::QuotationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QuotationDetails::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum QuotationDetails {
        Table,
        Id,
        QuotationId,
        ProductId,
        ProductName,
        ProductSku,
        ProductBrand,
        CategoryId,
        Quantity,
        PurchasePrice,
        DistributionPrice,
        UnitPrice,
        Discount,
        DiscountPercentage,
        Subtotal,
        TaxAmount,
        Total,
        UnitCost,
        TotalCost,
        UnitMargin,
        TotalMargin,
        MarginPercentage,
        SourceType,
        WarehouseId,
        SupplierId,
        SupplierProductId,
        IsRequestedFromSupplier,
        InStock,
        AvailableStock,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Quotations {
        Table,
        Id,
    }
}

mod m20250101_000004_create_status_history_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_status_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QuotationStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QuotationStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationStatusHistory::QuotationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationStatusHistory::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QuotationStatusHistory::PreviousStatus)
                                .string_len(20)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuotationStatusHistory::ChangedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QuotationStatusHistory::Notes).text().null())
                        .col(
                            ColumnDef::new(QuotationStatusHistory::Metadata)
                                .json_binary()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(QuotationStatusHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_quotation_status_history_quotation")
                                .from(
                                    QuotationStatusHistory::Table,
                                    QuotationStatusHistory::QuotationId,
                                )
                                .to(Quotations::Table, Quotations::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_quotation_status_history_quotation_id")
                        .table(QuotationStatusHistory::Table)
                        .col(QuotationStatusHistory::QuotationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(QuotationStatusHistory::Table)
                        .to_owned(),
                )
                .await
        }
    }

    #[derive(Iden)]
    enum QuotationStatusHistory {
        Table,
        Id,
        QuotationId,
        Status,
        PreviousStatus,
        ChangedBy,
        Notes,
        Metadata,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Quotations {
        Table,
        Id,
    }
}

mod m20250101_000005_create_price_source_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_price_source_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WarehouseInventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseInventory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::WarehouseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::AvailableStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::AverageCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WarehouseInventory::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_warehouse_inventory_product_warehouse")
                        .table(WarehouseInventory::Table)
                        .col(WarehouseInventory::ProductId)
                        .col(WarehouseInventory::WarehouseId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PriceListEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PriceListEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PriceListEntries::PriceListId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PriceListEntries::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PriceListEntries::WarehouseId).uuid().null())
                        .col(
                            ColumnDef::new(PriceListEntries::Price)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PriceListEntries::MinPrice)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PriceListEntries::MinQuantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(PriceListEntries::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_price_list_entries_product_id")
                        .table(PriceListEntries::Table)
                        .col(PriceListEntries::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SupplierProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SupplierProducts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::PurchasePrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::AvailableStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::Priority)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SupplierProducts::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_supplier_products_product_id")
                        .table(SupplierProducts::Table)
                        .col(SupplierProducts::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SupplierProducts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PriceListEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WarehouseInventory::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum WarehouseInventory {
        Table,
        Id,
        ProductId,
        WarehouseId,
        AvailableStock,
        AverageCost,
        IsActive,
    }

    #[derive(Iden)]
    enum PriceListEntries {
        Table,
        Id,
        PriceListId,
        ProductId,
        WarehouseId,
        Price,
        MinPrice,
        MinQuantity,
        IsActive,
    }

    #[derive(Iden)]
    enum SupplierProducts {
        Table,
        Id,
        SupplierId,
        ProductId,
        PurchasePrice,
        AvailableStock,
        Priority,
        IsActive,
    }
}

mod m20250101_000006_create_coupons_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000006_create_coupons_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Coupons::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Coupons::Code)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Coupons::DiscountType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::DiscountValue)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::MinOrderAmount)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::MaxDiscountAmount)
                                .decimal_len(12, 2)
                                .null(),
                        )
                        .col(ColumnDef::new(Coupons::UsageLimit).integer().null())
                        .col(
                            ColumnDef::new(Coupons::UsageCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Coupons::ValidFrom)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::ValidUntil)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Coupons {
        Table,
        Id,
        Code,
        DiscountType,
        DiscountValue,
        MinOrderAmount,
        MaxDiscountAmount,
        UsageLimit,
        UsageCount,
        ValidFrom,
        ValidUntil,
        IsActive,
    }
}

mod m20250101_000007_create_sales_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000007_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Sales::Code)
                                .string_len(20)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Sales::QuotationId).uuid().not_null())
                        .col(ColumnDef::new(Sales::SellerId).uuid().not_null())
                        .col(ColumnDef::new(Sales::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Sales::CustomerName).string().not_null())
                        .col(
                            ColumnDef::new(Sales::CustomerDocument)
                                .string_len(15)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Sales::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(Sales::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Sales::ExchangeRate)
                                .decimal_len(10, 4)
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Sales::Subtotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::Discount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Sales::Tax).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Sales::Total).decimal_len(12, 2).not_null())
                        .col(ColumnDef::new(Sales::SaleDate).date().not_null())
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SaleItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::ProductName).string().not_null())
                        .col(
                            ColumnDef::new(SaleItems::ProductSku)
                                .string_len(64)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(SaleItems::UnitPrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleItems::Discount)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SaleItems::Subtotal)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SaleItems::TaxAmount)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SaleItems::Total).decimal_len(12, 2).not_null())
                        .col(
                            ColumnDef::new(SaleItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_items_sale")
                                .from(SaleItems::Table, SaleItems::SaleId)
                                .to(Sales::Table, Sales::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Sales {
        Table,
        Id,
        Code,
        QuotationId,
        SellerId,
        CustomerId,
        CustomerName,
        CustomerDocument,
        WarehouseId,
        Currency,
        ExchangeRate,
        Subtotal,
        Discount,
        Tax,
        Total,
        SaleDate,
        CreatedAt,
    }

    #[derive(Iden)]
    enum SaleItems {
        Table,
        Id,
        SaleId,
        ProductId,
        ProductName,
        ProductSku,
        Quantity,
        UnitPrice,
        Discount,
        Subtotal,
        TaxAmount,
        Total,
        CreatedAt,
    }
}

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Receiving Gateway API",
        version = "0.3.1",
        description = r#"
# Warehouse Receiving Operations API

Floor-facing API for inbound receiving at a 3PL warehouse: order status
tracking, lot and pallet receiving, put-away assignment, barcode scanning,
arrival checklists, and damage reporting.

The gateway orchestrates the warehouse data API; it owns no persistence of
its own. Receive sessions, put-away boards, and scan sessions are ephemeral
and discarded on close or after the configured TTL.
        "#,
        contact(
            name = "Dockfront Engineering",
            email = "eng@dockfront.io"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "inbound-orders", description = "Inbound order detail and status transitions"),
        (name = "receiving", description = "Receive modal sessions: plain, lot, and pallet receiving"),
        (name = "putaway", description = "Put-away suggestion and confirmation boards"),
        (name = "scanners", description = "Barcode scan sessions"),
        (name = "checklist", description = "Arrival checklists"),
        (name = "damage-reports", description = "Damage reporting"),
        (name = "locations", description = "Location lookups")
    ),
    paths(
        // Inbound orders
        crate::handlers::inbound_orders::get_inbound_order,
        crate::handlers::inbound_orders::update_status,
        crate::handlers::inbound_orders::mark_complete,
        crate::handlers::inbound_orders::get_workflow_rules,
        crate::handlers::inbound_orders::reject_item,

        // Receiving sessions
        crate::handlers::receiving::open_session,
        crate::handlers::receiving::get_session,
        crate::handlers::receiving::add_lot_entry,
        crate::handlers::receiving::update_lot_entry,
        crate::handlers::receiving::set_quantity,
        crate::handlers::receiving::set_pallet_mode,
        crate::handlers::receiving::list_pallets,
        crate::handlers::receiving::select_pallet,
        crate::handlers::receiving::create_pallet,
        crate::handlers::receiving::submit,
        crate::handlers::receiving::close_session,

        // Put-away
        crate::handlers::putaway::open_board,
        crate::handlers::putaway::get_board,
        crate::handlers::putaway::select_sublocation,
        crate::handlers::putaway::confirm_line,
        crate::handlers::putaway::confirm_all,
        crate::handlers::putaway::close_board,

        // Scanners
        crate::handlers::scanners::open_session,
        crate::handlers::scanners::get_session,
        crate::handlers::scanners::scan,
        crate::handlers::scanners::confirm,
        crate::handlers::scanners::reset,
        crate::handlers::scanners::set_audio,
        crate::handlers::scanners::close_session,

        // Checklist
        crate::handlers::checklist::get_checklist,
        crate::handlers::checklist::toggle_checklist_item,

        // Damage reports
        crate::handlers::damage_reports::list_damage_reports,
        crate::handlers::damage_reports::create_damage_report,

        // Locations
        crate::handlers::locations::list_locations,
        crate::handlers::locations::list_sublocations,
    ),
    components(
        schemas(
            // Domain types
            crate::models::InboundOrder,
            crate::models::InboundOrderStatus,
            crate::models::InboundLineItem,
            crate::models::ProductRef,
            crate::models::Pallet,
            crate::models::PalletContent,
            crate::models::NewPallet,
            crate::models::Location,
            crate::models::Sublocation,
            crate::models::PutAwaySuggestion,
            crate::models::WorkflowRules,
            crate::models::ChecklistItem,
            crate::models::DamageReport,
            crate::models::NewDamageReport,
            crate::models::DamageSeverity,
            crate::models::ScannedEntity,
            crate::models::ScanWorkflow,
            crate::models::ScanStage,
            crate::models::ScanOutcome,
            crate::models::ScanTone,
            crate::models::ScanEvent,

            // Derived views
            crate::services::reconciliation::LineItemProgress,
            crate::services::reconciliation::ItemBadge,
            crate::services::reconciliation::ReceivingSummary,
            crate::services::receiving::LotEntry,
            crate::services::receiving::ReceiveMode,
            crate::services::receiving::ReceiveSessionView,
            crate::services::receiving::ReceiveOutcome,
            crate::services::putaway::PutAwayLine,
            crate::services::putaway::PutAwayBoardView,
            crate::services::putaway::ConfirmAllOutcome,
            crate::services::scanner::ScanPhase,
            crate::services::scanner::ScanSessionView,
            crate::services::scanner::ScanFeedback,
            crate::services::support::StepOutcome,
            crate::services::support::StepStatus,
            crate::services::support::BatchReport,

            // Request bodies
            crate::handlers::inbound_orders::OrderDetailResponse,
            crate::handlers::inbound_orders::UpdateStatusRequest,
            crate::handlers::inbound_orders::RejectItemRequest,
            crate::handlers::receiving::OpenSessionRequest,
            crate::handlers::receiving::SetQuantityRequest,
            crate::handlers::receiving::SetPalletModeRequest,
            crate::handlers::receiving::SelectPalletRequest,
            crate::handlers::receiving::CreatePalletRequest,
            crate::handlers::putaway::OpenBoardRequest,
            crate::handlers::putaway::SelectSublocationRequest,
            crate::handlers::scanners::OpenScanSessionRequest,
            crate::handlers::scanners::ScanRequest,
            crate::handlers::scanners::SetAudioRequest,
            crate::handlers::checklist::ToggleChecklistRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

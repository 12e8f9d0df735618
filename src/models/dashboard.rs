//! State model shared by the `sentry_dashboard` resource and data source.

use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::apiclient::{Dashboard, DashboardRequest, DashboardWidget, WidgetLayout, WidgetQuery};
use crate::schema::{
    Attribute, AttributeFlags, AttributeType, Block, Diagnostic, NestedBlock, Schema,
};

/// State of a `sentry_dashboard` resource or data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardModel {
    /// `organization/internal_id`.
    pub id: Option<String>,
    /// Organization slug.
    #[serde(deserialize_with = "null_as_default")]
    pub organization: String,
    /// Dashboard ID assigned by Sentry.
    #[serde(deserialize_with = "null_as_default")]
    pub internal_id: String,
    /// Dashboard title.
    pub title: Option<String>,
    /// Widgets in display order.
    #[serde(deserialize_with = "null_as_default")]
    pub widget: Vec<WidgetModel>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetModel {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_type: String,
    pub interval: Option<String>,
    pub widget_type: Option<String>,
    pub limit: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub query: Vec<QueryModel>,
    /// Zero or one element.
    #[serde(deserialize_with = "null_as_default")]
    pub layout: Vec<LayoutModel>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryModel {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fields: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub aggregates: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub columns: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub field_aliases: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub conditions: String,
    #[serde(deserialize_with = "null_as_default")]
    pub order_by: String,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutModel {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub min_h: i64,
}

fn strings() -> AttributeType {
    AttributeType::list(AttributeType::String)
}

fn required_int64() -> Attribute {
    Attribute::new(AttributeType::Int64, AttributeFlags::required())
}

impl DashboardModel {
    /// Schema of the `sentry_dashboard` resource.
    ///
    /// Widgets are list blocks. Query values Sentry fills in when omitted are
    /// optional and computed.
    pub fn resource_schema() -> Schema {
        let optional_strings = || Attribute::new(strings(), AttributeFlags::optional_computed());

        let query = Block::new()
            .with_attribute("name", Attribute::optional_computed_string())
            .with_attribute("fields", optional_strings())
            .with_attribute("aggregates", optional_strings())
            .with_attribute("columns", optional_strings())
            .with_attribute("field_aliases", optional_strings())
            .with_attribute("conditions", Attribute::optional_computed_string())
            .with_attribute("order_by", Attribute::optional_computed_string());
        let layout = Block::new()
            .with_attribute("x", required_int64())
            .with_attribute("y", required_int64())
            .with_attribute("w", required_int64())
            .with_attribute("h", required_int64())
            .with_attribute("min_h", Attribute::optional_computed_int64());
        let widget = Block::new()
            .with_attribute("title", Attribute::required_string())
            .with_attribute(
                "display_type",
                Attribute::required_string().with_description("e.g. `line`, `table`, `world_map`."),
            )
            .with_attribute("interval", Attribute::optional_computed_string())
            .with_attribute("widget_type", Attribute::optional_computed_string())
            .with_attribute("limit", Attribute::optional_int64())
            .with_block("query", NestedBlock::list(query).with_min_items(1))
            .with_block(
                "layout",
                NestedBlock::list(layout)
                    .with_min_items(1)
                    .with_max_items(1),
            );

        Schema::v0()
            .with_description("A dashboard and its widgets.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "organization",
                Attribute::required_string()
                    .with_force_new()
                    .with_description("The organization the dashboard belongs to."),
            )
            .with_attribute("title", Attribute::required_string())
            .with_attribute(
                "internal_id",
                Attribute::computed_string().with_description("The dashboard ID."),
            )
            .with_block("widget", NestedBlock::list(widget))
    }

    /// Schema of the `sentry_dashboard` data source.
    pub fn data_source_schema() -> Schema {
        let query = AttributeType::object([
            ("name", AttributeType::String),
            ("fields", strings()),
            ("aggregates", strings()),
            ("columns", strings()),
            ("field_aliases", strings()),
            ("conditions", AttributeType::String),
            ("order_by", AttributeType::String),
        ]);
        let layout = AttributeType::object([
            ("x", AttributeType::Int64),
            ("y", AttributeType::Int64),
            ("w", AttributeType::Int64),
            ("h", AttributeType::Int64),
            ("min_h", AttributeType::Int64),
        ]);
        let widget = AttributeType::object([
            ("title", AttributeType::String),
            ("display_type", AttributeType::String),
            ("interval", AttributeType::String),
            ("widget_type", AttributeType::String),
            ("limit", AttributeType::Int64),
            ("query", AttributeType::list(query)),
            ("layout", AttributeType::list(layout)),
        ]);

        Schema::v0()
            .with_description("Look up a dashboard and its widgets.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "organization",
                Attribute::required_string()
                    .with_description("The organization the dashboard belongs to."),
            )
            .with_attribute(
                "internal_id",
                Attribute::required_string().with_description("The dashboard ID."),
            )
            .with_attribute("title", Attribute::computed_string())
            .with_attribute(
                "widget",
                Attribute::new(AttributeType::list(widget), AttributeFlags::computed()),
            )
    }

    /// Copy an API dashboard into this model.
    pub fn fill(&mut self, organization: &str, dashboard: &Dashboard) {
        self.organization = organization.to_string();
        self.internal_id = dashboard.id.clone();
        self.id = Some(format!("{}/{}", organization, dashboard.id));
        self.title = Some(dashboard.title.clone());
        self.widget = dashboard.widgets.iter().map(WidgetModel::from).collect();
    }

    /// Build the create/update body. The widgets replace the existing set.
    pub fn to_request(&self) -> Result<DashboardRequest, Diagnostic> {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => Ok(DashboardRequest {
                title: title.to_string(),
                widgets: self.widget.iter().map(DashboardWidget::from).collect(),
            }),
            _ => Err(Diagnostic::attribute_error(
                "title",
                "Missing title",
                "A dashboard needs a non-empty title",
            )),
        }
    }
}

impl From<&DashboardWidget> for WidgetModel {
    fn from(widget: &DashboardWidget) -> Self {
        Self {
            title: widget.title.clone(),
            display_type: widget.display_type.clone(),
            interval: widget.interval.clone(),
            widget_type: widget.widget_type.clone(),
            limit: widget.limit,
            query: widget.queries.iter().map(QueryModel::from).collect(),
            layout: widget.layout.map(LayoutModel::from).into_iter().collect(),
        }
    }
}

impl From<&WidgetModel> for DashboardWidget {
    fn from(widget: &WidgetModel) -> Self {
        Self {
            title: widget.title.clone(),
            display_type: widget.display_type.clone(),
            interval: widget.interval.clone(),
            widget_type: widget.widget_type.clone(),
            limit: widget.limit,
            queries: widget.query.iter().map(WidgetQuery::from).collect(),
            layout: widget.layout.first().copied().map(WidgetLayout::from),
        }
    }
}

impl From<&WidgetQuery> for QueryModel {
    fn from(query: &WidgetQuery) -> Self {
        Self {
            name: query.name.clone(),
            fields: query.fields.clone(),
            aggregates: query.aggregates.clone(),
            columns: query.columns.clone(),
            field_aliases: query.field_aliases.clone(),
            conditions: query.conditions.clone(),
            order_by: query.orderby.clone(),
        }
    }
}

impl From<&QueryModel> for WidgetQuery {
    fn from(query: &QueryModel) -> Self {
        Self {
            name: query.name.clone(),
            fields: query.fields.clone(),
            aggregates: query.aggregates.clone(),
            columns: query.columns.clone(),
            field_aliases: query.field_aliases.clone(),
            conditions: query.conditions.clone(),
            orderby: query.order_by.clone(),
        }
    }
}

impl From<WidgetLayout> for LayoutModel {
    fn from(layout: WidgetLayout) -> Self {
        Self {
            x: layout.x,
            y: layout.y,
            w: layout.w,
            h: layout.h,
            min_h: layout.min_h,
        }
    }
}

impl From<LayoutModel> for WidgetLayout {
    fn from(layout: LayoutModel) -> Self {
        Self {
            x: layout.x,
            y: layout.y,
            w: layout.w,
            h: layout.h,
            min_h: layout.min_h,
        }
    }
}

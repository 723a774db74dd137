use serde::{Deserialize, Serialize};

/// Presentation settings for one line chart.
///
/// Nothing here is rendered server-side; settings are serialized as-is for
/// the charting frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub y_axis: AxisSpec,
    pub series: Vec<String>,
    pub data_zoom: DataZoomSpec,
    pub label_show: bool,
    pub area_opacity: f64,
    pub stack: String,
    pub max_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_formatter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataZoomSpec {
    pub start: f64,
    pub end: f64,
    pub x_axis_index: Vec<usize>,
}

impl Default for DataZoomSpec {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 100.0,
            x_axis_index: vec![0],
        }
    }
}

impl ChartSpec {
    /// Stacked area chart with labels shown and the full range zoomed in.
    pub fn stacked_area(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            y_axis: AxisSpec {
                name: String::new(),
                label_formatter: None,
            },
            series: Vec::new(),
            data_zoom: DataZoomSpec::default(),
            label_show: true,
            area_opacity: 0.8,
            stack: "stack".to_string(),
            max_points: 30,
        }
    }

    pub fn with_y_axis(mut self, name: impl Into<String>, formatter: Option<&str>) -> Self {
        self.y_axis = AxisSpec {
            name: name.into(),
            label_formatter: formatter.map(str::to_string),
        };
        self
    }

    pub fn with_series<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.series = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }
}

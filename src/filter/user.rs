use super::filter_where::FilterWhere;
use super::query::QueryParams;
use super::types::SqlParam;

/// `GET /api/users/?is_subscribed=1`: narrow the listing to authors the viewer follows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub is_subscribed: bool,
}

impl UserFilter {
    pub fn from_query(query: &QueryParams) -> Self {
        Self {
            is_subscribed: query.flag("is_subscribed"),
        }
    }

    /// Conditions over `users u`
    pub fn to_where(&self, viewer: Option<i64>, starting_param_index: usize) -> FilterWhere {
        let mut filter = FilterWhere::new(starting_param_index);
        if let (true, Some(user_id)) = (self.is_subscribed, viewer) {
            filter.push_with(SqlParam::Int(user_id), |p| {
                format!("EXISTS (SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.user_id = {})", p)
            });
        }
        filter
    }
}

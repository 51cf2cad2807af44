//! PostgREST client for the bookings table.

use crate::config::SupabaseConfig;
use kinxplore_bookings::store::AdminCapability;
use kinxplore_bookings::{
    BackendError, BackendFuture, Booking, BookingBackend, BookingId, BookingPatch, StatRow, UserId,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Bookings with the joins the board shows
pub const BOOKING_SELECT: &str = "*,destination:destinations(id,name,image_url,location),user:profiles!bookings_user_id_fkey(id,full_name,email),assigned_admin:profiles!bookings_assigned_to_fkey(id,full_name,email)";

/// Columns the statistics need
pub const STATISTICS_SELECT: &str = "status,priority,created_at,total_price";

/// Role that grants the admin capability
pub const ADMIN_ROLE: &str = "admin";

#[derive(Deserialize)]
struct ProfileRole {
    role: Option<String>,
}

/// [`BookingBackend`] over Supabase's PostgREST API
#[derive(Clone)]
pub struct PostgrestBookingBackend {
    client: Client,
    config: SupabaseConfig,
}

impl PostgrestBookingBackend {
    /// Create a client for a project
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::RequestFailed`] if the HTTP client cannot be
    /// built (TLS backend unavailable).
    pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Project settings
    #[must_use]
    pub const fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn bookings(&self, method: Method) -> RequestBuilder {
        self.authorized(self.client.request(method, self.config.rest_url("bookings")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.config.anon_key())
            .bearer_auth(self.config.bearer())
    }

    /// Role of a staff profile, `None` if the profile has none
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no profile has this id, or
    /// another [`BackendError`] if the request fails.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_role(&self, actor: &UserId) -> Result<Option<String>, BackendError> {
        let response = self
            .authorized(self.client.get(self.config.rest_url("profiles")))
            .query(&[("select", "role".to_string()), ("id", format!("eq.{actor}"))])
            .send()
            .await
            .map_err(request_failed)?;

        let profiles: Vec<ProfileRole> = decode(response).await?;
        profiles
            .into_iter()
            .next()
            .map(|profile| profile.role)
            .ok_or_else(|| BackendError::NotFound(format!("profile {actor}")))
    }

    /// Whether the actor may manage bookings
    ///
    /// An unknown profile or a non-admin role yields `Absent`; transport
    /// failures are returned so the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails for a reason other than
    /// a missing profile.
    pub async fn probe_capability(&self, actor: &UserId) -> Result<AdminCapability, BackendError> {
        match self.fetch_role(actor).await {
            Ok(Some(role)) if role == ADMIN_ROLE => Ok(AdminCapability::Granted),
            Ok(role) => {
                tracing::info!(%actor, ?role, "Actor is not an admin");
                Ok(AdminCapability::Absent)
            },
            Err(BackendError::NotFound(_)) => {
                tracing::info!(%actor, "No profile for actor");
                Ok(AdminCapability::Absent)
            },
            Err(error) => Err(error),
        }
    }
}

fn request_failed(error: reqwest::Error) -> BackendError {
    BackendError::RequestFailed(error.to_string())
}

/// Map non-2xx statuses onto [`BackendError`]
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %body, "PostgREST request failed");
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(body),
        StatusCode::NOT_FOUND => BackendError::NotFound(body),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited,
        status => BackendError::Api {
            status: status.as_u16(),
            message: body,
        },
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    check(response)
        .await?
        .json::<T>()
        .await
        .map_err(|e| BackendError::ResponseParseFailed(e.to_string()))
}

impl BookingBackend for PostgrestBookingBackend {
    fn list_bookings(&self) -> BackendFuture<'_, Vec<Booking>> {
        Box::pin(async move {
            let response = self
                .bookings(Method::GET)
                .query(&[("select", BOOKING_SELECT), ("order", "created_at.desc")])
                .send()
                .await
                .map_err(request_failed)?;
            decode(response).await
        })
    }

    fn list_statistic_rows(&self) -> BackendFuture<'_, Vec<StatRow>> {
        Box::pin(async move {
            let response = self
                .bookings(Method::GET)
                .query(&[("select", STATISTICS_SELECT)])
                .send()
                .await
                .map_err(request_failed)?;
            decode(response).await
        })
    }

    fn update_booking<'a>(
        &'a self,
        id: &'a BookingId,
        patch: &'a BookingPatch,
    ) -> BackendFuture<'a, Booking> {
        Box::pin(async move {
            let response = self
                .bookings(Method::PATCH)
                .query(&[("id", format!("eq.{id}")), ("select", BOOKING_SELECT.to_string())])
                .header("Prefer", "return=representation")
                .json(patch)
                .send()
                .await
                .map_err(request_failed)?;

            // PostgREST answers a filter that matched nothing with `[]`
            let rows: Vec<Booking> = decode(response).await?;
            rows.into_iter()
                .next()
                .ok_or_else(|| BackendError::NotFound(id.to_string()))
        })
    }

    fn delete_booking<'a>(&'a self, id: &'a BookingId) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let response = self
                .bookings(Method::DELETE)
                .query(&[("id", format!("eq.{id}"))])
                .send()
                .await
                .map_err(request_failed)?;
            check(response).await?;
            Ok(())
        })
    }
}

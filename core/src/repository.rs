//! Facade pairing `LumiClient` with a `Transport` and a caller identity.
//!
//! The caller is injected once at construction and attached to every
//! authenticated request. `with_caller` gives a copy acting for someone
//! else. Models come back exactly as the client parsed them.

use std::sync::Arc;

use tracing::debug;

use crate::client::{DateRange, LumiClient};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::CallerId;
use crate::transport::Transport;
use crate::types::{
    Ack, Booking, BookingRequest, City, CityId, MasterDetail, MasterId, MasterSummary, ServiceId,
    TimeSlot,
};

pub struct Repository<T> {
    client: LumiClient,
    transport: Arc<T>,
    caller: CallerId,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
            caller: self.caller,
        }
    }
}

impl<T: Transport> Repository<T> {
    pub fn new(client: LumiClient, transport: T, caller: CallerId) -> Self {
        Self {
            client,
            transport: Arc::new(transport),
            caller,
        }
    }

    /// A repository sharing this one's transport but acting for `caller`.
    pub fn with_caller(&self, caller: CallerId) -> Self {
        Self {
            caller,
            ..self.clone()
        }
    }

    pub fn caller(&self) -> CallerId {
        self.caller
    }

    pub fn client(&self) -> &LumiClient {
        &self.client
    }

    /// Masters on the caller's own list.
    pub async fn masters(&self) -> Result<Vec<MasterSummary>, ApiError> {
        let response = self.send(self.client.build_list_masters(self.caller)).await?;
        self.client.parse_list_masters(response)
    }

    pub async fn master(&self, master_id: MasterId) -> Result<MasterDetail, ApiError> {
        let response = self
            .send(self.client.build_get_master(self.caller, master_id))
            .await?;
        self.client.parse_get_master(response)
    }

    pub async fn time_slots(
        &self,
        master_id: MasterId,
        service_id: ServiceId,
        range: DateRange,
    ) -> Result<Vec<TimeSlot>, ApiError> {
        let request = self
            .client
            .build_list_time_slots(self.caller, master_id, service_id, &range);
        let response = self.send(request).await?;
        self.client.parse_list_time_slots(response)
    }

    pub async fn book(&self, request: &BookingRequest) -> Result<Booking, ApiError> {
        let response = self
            .send(self.client.build_create_booking(self.caller, request)?)
            .await?;
        self.client.parse_create_booking(response)
    }

    pub async fn bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let response = self.send(self.client.build_list_bookings(self.caller)).await?;
        self.client.parse_list_bookings(response)
    }

    pub async fn add_master(&self, master_id: MasterId) -> Result<Ack, ApiError> {
        let response = self
            .send(self.client.build_add_master(self.caller, master_id))
            .await?;
        self.client.parse_add_master(response)
    }

    pub async fn remove_master(&self, master_id: MasterId) -> Result<Ack, ApiError> {
        let response = self
            .send(self.client.build_remove_master(self.caller, master_id))
            .await?;
        self.client.parse_remove_master(response)
    }

    pub async fn cities(&self) -> Result<Vec<City>, ApiError> {
        let response = self.send(self.client.build_list_cities()).await?;
        self.client.parse_list_cities(response)
    }

    /// Masters in a city, excluding those already on the caller's list.
    pub async fn city_masters(&self, city_id: CityId) -> Result<Vec<MasterSummary>, ApiError> {
        let response = self
            .send(self.client.build_list_city_masters(self.caller, city_id))
            .await?;
        self.client.parse_list_city_masters(response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(caller = %self.caller, method = %request.method, path = %request.path, "dispatching");
        self.transport.execute(request).await.inspect_err(|err| {
            debug!(caller = %self.caller, error = %err, "request failed before a response arrived");
        })
    }
}

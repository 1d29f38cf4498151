//! Screen models: one `StateHolder` bound to the repository call that
//! feeds it.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::watch;

use crate::client::DateRange;
use crate::error::ApiError;
use crate::repository::Repository;
use crate::state::{StateHolder, ViewData, ViewState};
use crate::transport::Transport;
use crate::types::{Booking, City, CityId, MasterDetail, MasterId, MasterSummary, ServiceId, TimeSlot};

pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

type Fetch<T> = Box<dyn Fn() -> FetchFuture<T> + Send + Sync>;

pub struct ScreenModel<T> {
    holder: StateHolder<T>,
    fetch: Fetch<T>,
}

impl<T: ViewData> ScreenModel<T> {
    pub fn new<F>(fetch: F) -> Self
    where
        F: Fn() -> FetchFuture<T> + Send + Sync + 'static,
    {
        Self {
            holder: StateHolder::new(),
            fetch: Box::new(fetch),
        }
    }

    /// First display: load unless something has already happened.
    pub fn start(&self) -> bool {
        let state = self.holder.snapshot();
        if state.is_loading || state.loaded || state.error.is_some() {
            return false;
        }
        self.holder.launch((self.fetch)())
    }

    /// Reload from any phase; ignored while a fetch is in flight.
    pub fn retry(&self) -> bool {
        self.holder.launch((self.fetch)())
    }

    pub fn cancel(&self) {
        self.holder.cancel();
    }

    pub fn state(&self) -> ViewState<T> {
        self.holder.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> {
        self.holder.subscribe()
    }

    pub async fn settled(&self) -> ViewState<T> {
        self.holder.settled().await
    }
}

/// The caller's own masters.
pub fn masters_screen<T: Transport>(repository: &Repository<T>) -> ScreenModel<Vec<MasterSummary>> {
    let repository = repository.clone();
    ScreenModel::new(move || {
        let repository = repository.clone();
        Box::pin(async move { repository.masters().await })
    })
}

/// Masters available in a city, for the search screen.
pub fn city_masters_screen<T: Transport>(
    repository: &Repository<T>,
    city_id: CityId,
) -> ScreenModel<Vec<MasterSummary>> {
    let repository = repository.clone();
    ScreenModel::new(move || {
        let repository = repository.clone();
        Box::pin(async move { repository.city_masters(city_id).await })
    })
}

pub fn master_detail_screen<T: Transport>(
    repository: &Repository<T>,
    master_id: MasterId,
) -> ScreenModel<Option<MasterDetail>> {
    let repository = repository.clone();
    ScreenModel::new(move || {
        let repository = repository.clone();
        Box::pin(async move { repository.master(master_id).await.map(Some) })
    })
}

pub fn time_slots_screen<T: Transport>(
    repository: &Repository<T>,
    master_id: MasterId,
    service_id: ServiceId,
    range: DateRange,
) -> ScreenModel<Vec<TimeSlot>> {
    let repository = repository.clone();
    ScreenModel::new(move || {
        let repository = repository.clone();
        Box::pin(async move { repository.time_slots(master_id, service_id, range).await })
    })
}

pub fn bookings_screen<T: Transport>(repository: &Repository<T>) -> ScreenModel<Vec<Booking>> {
    let repository = repository.clone();
    ScreenModel::new(move || {
        let repository = repository.clone();
        Box::pin(async move { repository.bookings().await })
    })
}

pub fn cities_screen<T: Transport>(repository: &Repository<T>) -> ScreenModel<Vec<City>> {
    let repository = repository.clone();
    ScreenModel::new(move || {
        let repository = repository.clone();
        Box::pin(async move { repository.cities().await })
    })
}

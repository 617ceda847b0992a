use crate::db::crud::{Crud, Fields, Mutation, Record, SelectQuery};
use crate::error::{CrudError, PorticoError};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde_json::Value;
use tracing::info;

#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert one row and return its generated id.
    Insert(String, Fields, RpcReplyPort<Result<i64, CrudError>>),

    /// Select at most one row.
    SelectOne(String, SelectQuery, RpcReplyPort<Result<Option<Record>, CrudError>>),

    /// Select every matching row.
    SelectAll(String, SelectQuery, RpcReplyPort<Result<Vec<Record>, CrudError>>),

    /// Update rows matching the conditions (data, conditions).
    Update(String, Fields, Fields, RpcReplyPort<Result<Mutation, CrudError>>),

    /// Delete rows matching the conditions.
    Delete(String, Fields, RpcReplyPort<Result<Mutation, CrudError>>),

    /// Raw parameterized statement returning rows.
    Query(String, Vec<Value>, RpcReplyPort<Result<Vec<Record>, CrudError>>),

    /// Raw parameterized statement returning the affected-row count.
    Execute(String, Vec<Value>, RpcReplyPort<Result<u64, CrudError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn insert(&self, table: &str, data: Fields) -> Result<i64, PorticoError> {
        let res = ractor::call!(self.actor, DbActorMessage::Insert, table.to_string(), data)
            .map_err(|e| PorticoError::RactorError(format!("DbActor Insert RPC failed: {e}")))?;
        Ok(res?)
    }

    pub async fn select_one(
        &self,
        table: &str,
        query: SelectQuery,
    ) -> Result<Option<Record>, PorticoError> {
        let res = ractor::call!(self.actor, DbActorMessage::SelectOne, table.to_string(), query)
            .map_err(|e| PorticoError::RactorError(format!("DbActor SelectOne RPC failed: {e}")))?;
        Ok(res?)
    }

    pub async fn select_all(
        &self,
        table: &str,
        query: SelectQuery,
    ) -> Result<Vec<Record>, PorticoError> {
        let res = ractor::call!(self.actor, DbActorMessage::SelectAll, table.to_string(), query)
            .map_err(|e| PorticoError::RactorError(format!("DbActor SelectAll RPC failed: {e}")))?;
        Ok(res?)
    }

    pub async fn update(
        &self,
        table: &str,
        data: Fields,
        conditions: Fields,
    ) -> Result<Mutation, PorticoError> {
        let res = ractor::call!(
            self.actor,
            DbActorMessage::Update,
            table.to_string(),
            data,
            conditions
        )
        .map_err(|e| PorticoError::RactorError(format!("DbActor Update RPC failed: {e}")))?;
        Ok(res?)
    }

    pub async fn delete(&self, table: &str, conditions: Fields) -> Result<Mutation, PorticoError> {
        let res = ractor::call!(self.actor, DbActorMessage::Delete, table.to_string(), conditions)
            .map_err(|e| PorticoError::RactorError(format!("DbActor Delete RPC failed: {e}")))?;
        Ok(res?)
    }

    pub async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Record>, PorticoError> {
        let res = ractor::call!(self.actor, DbActorMessage::Query, sql.to_string(), params)
            .map_err(|e| PorticoError::RactorError(format!("DbActor Query RPC failed: {e}")))?;
        Ok(res?)
    }

    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64, PorticoError> {
        let res = ractor::call!(self.actor, DbActorMessage::Execute, sql.to_string(), params)
            .map_err(|e| PorticoError::RactorError(format!("DbActor Execute RPC failed: {e}")))?;
        Ok(res?)
    }
}

struct DbActorState {
    crud: Crud,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let crud = Crud::connect(database_url.as_str())
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { crud })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let crud = &state.crud;
        match message {
            DbActorMessage::Insert(table, data, reply) => {
                let _ = reply.send(crud.insert(&table, &data).await);
            }
            DbActorMessage::SelectOne(table, query, reply) => {
                let _ = reply.send(crud.select_one(&table, &query).await);
            }
            DbActorMessage::SelectAll(table, query, reply) => {
                let _ = reply.send(crud.select_all(&table, &query).await);
            }
            DbActorMessage::Update(table, data, conditions, reply) => {
                let _ = reply.send(crud.update(&table, &data, &conditions).await);
            }
            DbActorMessage::Delete(table, conditions, reply) => {
                let _ = reply.send(crud.delete(&table, &conditions).await);
            }
            DbActorMessage::Query(sql, params, reply) => {
                let _ = reply.send(crud.query(&sql, &params).await);
            }
            DbActorMessage::Execute(sql, params, reply) => {
                let _ = reply.send(crud.execute(&sql, &params).await);
            }
        }
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, PorticoError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| PorticoError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

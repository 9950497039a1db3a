//! Sample sentences covering every statement kind.

pub const DEMO_QUERIES: &[&str] = &[
    // CREATE TABLE
    "Crear una tabla llamada usuarios con las columnas id, nombre, edad correo, fecha",
    "Generar la tabla productos con los campos id, nombre, categoría y precio",
    // INSERT
    "Insertar en la tabla usuarios a Ana con edad 30 y email ana@mail.com",
    "Añadir un nuevo registro en productos: laptop, electrónica, 1500",
    // UPDATE
    "Actualizar el correo de Ana a ana.nueva@empresa.com en la tabla usuarios",
    "Modificar el precio del producto iPhone a 999 en la tabla productos",
    // DELETE
    "Borrar el registro de Luis de la tabla usuarios",
    "Eliminar de la tabla productos todos los items con precio menor a 10",
    // SELECT
    "Mostrar todos los usuarios cuya edad sea mayor o igual a 25",
    "Dame los nombres de los usuarios que tengan más de 50 años",
    "Listar los primeros 10 productos con categoría ropa",
    "Contar cuántos productos hay en la categoría electrónicos",
    "Dime el total de la suma de precios de la tabla productos",
    "¿Cuál es el promedio de edad de los usuarios?",
    "Muéstrame el precio máximo de los artículos de tipo oficina",
];
